extern crate crayon_batch;
extern crate env_logger;

use crayon_batch::device::headless::Command;
use crayon_batch::prelude::*;

const VS: &str = "
attribute vec2 position;
uniform vec4 color;
uniform mat4 transform;
uniform float alpha;
";

const FS: &str = "
uniform sampler2D texture0;
uniform sampler2D texture1;
void main() {}
";

fn setup() -> RenderState<HeadlessDevice> {
    let _ = env_logger::try_init();

    let device = HeadlessDevice::new(DeviceParams::default());
    let mut state = RenderState::new(device, Settings::default()).unwrap();
    for i in 0..3 {
        state.load_program(i, VS, FS, 2).unwrap();
        assert_eq!(state.add_uniform(i, "color", UniformFormat::Vector4f).unwrap(), Some(0));
        assert_eq!(state.add_uniform(i, "transform", UniformFormat::Matrix4f).unwrap(), Some(1));
        assert_eq!(state.add_uniform(i, "alpha", UniformFormat::F32).unwrap(), Some(2));
    }

    state.device_mut().clear_commands();
    state
}

fn uploads(state: &RenderState<HeadlessDevice>) -> usize {
    state.device().count(|v| match *v {
        Command::SetUniform(..) => true,
        _ => false,
    })
}

#[test]
fn layout() {
    let state = setup();
    let offsets: Vec<_> = state
        .uniform_layout(0)
        .unwrap()
        .iter()
        .map(|v| v.offset)
        .collect();

    assert_eq!(offsets, vec![0, 4, 20]);
    assert_eq!(state.material_footprint(0).unwrap(), 21);
    assert_eq!(state.uniform(0, 1).unwrap().format, UniformFormat::Matrix4f);
    assert!(state.uniform(0, 3).is_err());
    assert!(state.material_footprint(16).is_err());
}

#[test]
fn footprint_without_uniforms() {
    let mut state = setup();
    state.load_program(3, VS, FS, 1).unwrap();
    assert_eq!(state.material_footprint(3).unwrap(), 0);

    let m = state.create_material(3).unwrap();
    assert!(m.values().is_empty());
}

#[test]
fn uniform_not_found() {
    let mut state = setup();
    assert_eq!(state.add_uniform(0, "missing", UniformFormat::F32).unwrap(), None);
    assert_eq!(state.uniform_layout(0).unwrap().len(), 3);
    assert_eq!(state.material_footprint(0).unwrap(), 21);
}

#[test]
fn too_many_uniforms() {
    let mut state = setup();
    let names: Vec<_> = (0..16).map(|i| format!("u{:02}", i)).collect();
    let vs = names
        .iter()
        .map(|v| format!("uniform float {};", v))
        .collect::<Vec<_>>()
        .join("\n");

    state.load_program(4, &vs, FS, 0).unwrap();
    for (i, v) in names.iter().enumerate() {
        assert_eq!(state.add_uniform(4, v, UniformFormat::F32).unwrap(), Some(i));
    }

    assert!(state.add_uniform(4, "u00", UniformFormat::F32).is_err());
}

#[test]
fn init() {
    let mut state = setup();
    assert!(state.init_material(vec![0.0; 20], 0).is_err());
    assert!(state.init_material(vec![0.0; 21], 5).is_err());

    let m = state.init_material(vec![3.0; 32], 0).unwrap();
    assert_eq!(m.values(), &[0.0; 21][..]);
    assert_eq!(m.program(), 0);
    assert!(m.textures().iter().all(|v| v.is_none()));
}

#[test]
fn isolation() {
    let mut state = setup();
    let mut m = state.create_material(0).unwrap();
    m.set_uniform(0, &[0.1, 0.2, 0.3, 0.4]).unwrap();

    let before = m.values().to_vec();
    assert!(m.set_uniform(0, &[1.0; 3]).is_err());
    assert!(m.set_uniform(1, &[1.0; 9]).is_err());
    assert!(m.set_uniform(2, &[]).is_err());
    assert!(m.set_uniform(3, &[1.0]).is_err());
    assert_eq!(m.values(), &before[..]);

    assert!(m.set_texture(8, Some(TextureId(1))).is_err());
}

#[test]
fn dedup() {
    let mut state = setup();
    let textures = TextureTable::new();

    let mut m = state.create_material(0).unwrap();
    m.set_uniform(2, &[0.5]).unwrap();

    state.set_program(0).unwrap();
    assert!(state.apply_material(0, &m, &textures).unwrap());
    assert_eq!(uploads(&state), 3);
    assert!(!state.apply_material(0, &m, &textures).unwrap());
    assert_eq!(uploads(&state), 3);

    // Rebinding the program forgets the last applied material.
    state.set_program(1).unwrap();
    state.set_program(0).unwrap();
    assert!(state.apply_material(0, &m, &textures).unwrap());
    assert_eq!(uploads(&state), 6);

    // Another material of the same program is applied.
    let n = state.create_material(0).unwrap();
    assert!(state.apply_material(0, &n, &textures).unwrap());
    assert!(state.apply_material(0, &m, &textures).unwrap());
    assert_eq!(uploads(&state), 12);
}

#[test]
fn uploads_values() {
    let mut state = setup();
    let mut m = state.create_material(0).unwrap();
    m.set_uniform(0, &[1.0, 2.0, 3.0, 4.0]).unwrap();
    m.set_uniform(2, &[0.5]).unwrap();

    state.set_program(0).unwrap();
    state.apply_material(0, &m, &TextureTable::new()).unwrap();

    let values: Vec<_> = state
        .device()
        .commands()
        .iter()
        .filter_map(|v| match *v {
            Command::SetUniform(_, format, ref values) => Some((format, values.clone())),
            _ => None,
        })
        .collect();

    assert_eq!(values.len(), 3);
    assert_eq!(values[0], (UniformFormat::Vector4f, vec![1.0, 2.0, 3.0, 4.0]));
    assert_eq!(values[1], (UniformFormat::Matrix4f, vec![0.0; 16]));
    assert_eq!(values[2], (UniformFormat::F32, vec![0.5]));
}

#[test]
fn mismatch() {
    let mut state = setup();
    let textures = TextureTable::new();
    let m = state.create_material(0).unwrap();

    state.set_program(1).unwrap();
    assert!(!state.apply_material(1, &m, &textures).unwrap());
    assert!(!state.apply_material(0, &m, &textures).unwrap());
    assert_eq!(uploads(&state), 0);

    // Materials of a replaced program are stale.
    state.load_program(0, VS, FS, 2).unwrap();
    state.add_uniform(0, "color", UniformFormat::Vector4f).unwrap();
    state.set_program(0).unwrap();
    assert!(!state.apply_material(0, &m, &textures).unwrap());
    assert_eq!(uploads(&state), 0);
}

#[test]
fn stale_after_new_uniform() {
    let mut state = setup();
    let textures = TextureTable::new();

    state.load_program(5, VS, FS, 2).unwrap();
    state.add_uniform(5, "color", UniformFormat::Vector4f).unwrap();
    let m = state.create_material(5).unwrap();
    assert_eq!(m.values().len(), 4);

    // The program grew a uniform the material has no storage for.
    state.add_uniform(5, "alpha", UniformFormat::F32).unwrap();
    assert_eq!(state.material_footprint(5).unwrap(), 5);

    state.device_mut().clear_commands();
    assert!(!state.apply_material(5, &m, &textures).unwrap());
    assert_eq!(uploads(&state), 0);

    let n = state.create_material(5).unwrap();
    assert!(state.apply_material(5, &n, &textures).unwrap());
    assert_eq!(uploads(&state), 2);
}

#[test]
fn textures() {
    let mut state = setup();
    let t1 = TextureHandle::new(11).unwrap();
    let t3 = TextureHandle::new(13).unwrap();

    let mut textures = TextureTable::new();
    textures.insert(TextureId(1), t1);
    textures.insert(TextureId(3), t3);

    let mut m = state.create_material(0).unwrap();
    m.set_texture(0, Some(TextureId(1))).unwrap();
    // Not ready.
    m.set_texture(1, Some(TextureId(2))).unwrap();
    // Beyond the texture channels of the program.
    m.set_texture(2, Some(TextureId(3))).unwrap();

    state.set_program(0).unwrap();
    state.apply_material(0, &m, &textures).unwrap();

    assert_eq!(state.texture(0), Some(t1));
    assert_eq!(state.texture(1), None);
    assert_eq!(state.texture(2), None);
    assert_eq!(state.device().bound_texture(0), Some(t1));
}

#[test]
fn texture_flushes() {
    let mut state = setup();
    let mut textures = TextureTable::new();
    textures.insert(TextureId(1), TextureHandle::new(1).unwrap());

    let mut m = state.create_material(0).unwrap();
    m.set_texture(0, Some(TextureId(1))).unwrap();

    state.set_program(0).unwrap();
    state.draw(&[VertexPack::default(); 4], 0xFFFF_FFFF, 0).unwrap();
    state.apply_material(0, &m, &textures).unwrap();

    assert_eq!(state.pending(), 0);
    assert_eq!(state.drawcall_count(), 1);
    assert_eq!(state.device().draws()[0].textures[0], None);
}

#[test]
fn direct_uniform() {
    let mut state = setup();
    // Loading a program leaves no program current.
    state.load_program(3, VS, FS, 0).unwrap();
    assert!(state.set_uniform(0, UniformFormat::Vector4f, &[0.0; 4]).is_err());

    state.set_program(0).unwrap();
    state.set_uniform(0, UniformFormat::Vector4f, &[1.0; 4]).unwrap();
    assert_eq!(uploads(&state), 1);

    assert!(state.set_uniform(0, UniformFormat::Vector3f, &[1.0; 3]).is_err());
    assert!(state.set_uniform(0, UniformFormat::Vector4f, &[1.0; 3]).is_err());
    assert!(state.set_uniform(3, UniformFormat::F32, &[1.0]).is_err());
    assert_eq!(uploads(&state), 1);
}

#[test]
fn direct_uniform_flushes() {
    let mut state = setup();
    state.set_program(0).unwrap();
    state.draw(&[VertexPack::default(); 4], 0xFFFF_FFFF, 0).unwrap();
    state.set_uniform(2, UniformFormat::F32, &[1.0]).unwrap();
    assert_eq!(state.pending(), 0);
    assert_eq!(state.drawcall_count(), 1);
}

#[test]
fn sampler() {
    let mut state = setup();
    state.texture_uniform(0, "texture1", 1).unwrap();
    state.texture_uniform(0, "missing", 0).unwrap();
    assert!(state.texture_uniform(0, "texture0", 8).is_err());

    assert_eq!(state.current_program(), Some(0));
    let cmds: Vec<_> = state
        .device()
        .commands()
        .iter()
        .filter_map(|v| match *v {
            Command::SetUniformI32(_, unit) => Some(unit),
            _ => None,
        })
        .collect();

    assert_eq!(cmds, vec![1]);
}
