extern crate crayon_batch;
extern crate env_logger;

use crayon_batch::device::headless::Command;
use crayon_batch::device::DrawMode;
use crayon_batch::prelude::*;

const VS: &str = "attribute vec2 position; uniform vec4 color;";
const FS: &str = "void main() {}";
const BUFFER_VS: &str = "attribute vec2 position; uniform vec4 st;";

fn setup() -> RenderState<HeadlessDevice> {
    let _ = env_logger::try_init();

    let device = HeadlessDevice::new(DeviceParams::default());
    let mut state = RenderState::new(device, Settings::default()).unwrap();
    state.load_program(0, VS, FS, 1).unwrap();
    state.load_program(1, BUFFER_VS, FS, 1).unwrap();
    state.load_program(2, VS, FS, 1).unwrap();
    state.set_program(0).unwrap();
    state.device_mut().clear_commands();
    state
}

fn quad() -> [VertexPack; 4] {
    [
        VertexPack::new(0.0, 0.0, 0, 0),
        VertexPack::new(0.0, 1.0, 0, 1),
        VertexPack::new(1.0, 1.0, 1, 1),
        VertexPack::new(1.0, 0.0, 1, 0),
    ]
}

fn blends(state: &RenderState<HeadlessDevice>) -> usize {
    state.device().count(|v| match *v {
        Command::SetBlend(..) => true,
        _ => false,
    })
}

#[test]
fn setup_objects() {
    let device = HeadlessDevice::new(DeviceParams::default());
    let state = RenderState::new(device, Settings::default()).unwrap();

    // Index buffer, vertex buffer and vertex layout.
    assert_eq!(state.device().live_objects(), (2, 1, 0));
    assert_eq!(state.device().blend(), DEFAULT_BLEND);
    assert_eq!(state.blend(), DEFAULT_BLEND);
    assert_eq!(state.current_program(), None);
    assert_eq!(state.version(), 2);
}

#[test]
fn invalid_settings() {
    let mut settings = Settings::default();
    settings.render.max_combine = 0;

    let device = HeadlessDevice::new(settings.device);
    assert!(RenderState::new(device, settings).is_err());
}

#[test]
fn setup_failure_releases_objects() {
    let mut settings = Settings::default();

    // No room for the vertex buffer.
    settings.device.max_buffer = 1;
    let mut device = HeadlessDevice::new(settings.device);
    assert!(RenderState::new(&mut device, settings).is_err());
    assert_eq!(device.live_objects(), (0, 0, 0));

    // No room for the vertex layout.
    settings.device.max_buffer = 128;
    settings.device.max_layout = 0;
    let mut device = HeadlessDevice::new(settings.device);
    assert!(RenderState::new(&mut device, settings).is_err());
    assert_eq!(device.live_objects(), (0, 0, 0));
    assert_eq!(
        device.count(|v| match *v {
            Command::DeleteBuffer(_) => true,
            _ => false,
        }),
        2
    );
}

#[test]
fn failed_flush_keeps_quads() {
    let mut state = setup();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();

    // The device forgets its buffers, draws fail until the state is reset.
    state.device_mut().reset_state().unwrap();
    assert!(state.flush().is_err());
    assert_eq!(state.pending(), 2);
    assert_eq!(state.drawcall_count(), 0);

    state.reset().unwrap();
    state.flush().unwrap();
    assert_eq!(state.pending(), 0);
    assert_eq!(state.drawcall_count(), 1);

    let draws = state.device().draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].mode, DrawMode::Triangles);
    assert_eq!(draws[0].count, 12);
}

#[test]
fn restore_blend_idempotence() {
    let mut state = setup();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();

    state.restore_default_blend().unwrap();
    state.set_blend(BlendFactor::One, BlendFactor::OneMinusSrcAlpha).unwrap();
    assert_eq!(blends(&state), 0);
    assert_eq!(state.pending(), 1);
    assert_eq!(state.drawcall_count(), 0);
}

#[test]
fn blend() {
    let mut state = setup();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();

    state.set_blend(BlendFactor::SrcAlpha, BlendFactor::One).unwrap();
    assert_eq!(state.drawcall_count(), 1);
    assert_eq!(blends(&state), 1);

    // Same pair again, still flushed and applied.
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.set_blend(BlendFactor::SrcAlpha, BlendFactor::One).unwrap();
    assert_eq!(state.pending(), 0);
    assert_eq!(state.drawcall_count(), 2);
    assert_eq!(blends(&state), 2);

    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.restore_default_blend().unwrap();
    assert_eq!(state.pending(), 0);
    assert_eq!(state.drawcall_count(), 3);
    assert_eq!(blends(&state), 3);
    assert_eq!(state.device().blend(), DEFAULT_BLEND);

    let draws = state.device().draws();
    assert_eq!(draws[0].blend, DEFAULT_BLEND);
    assert_eq!(draws[1].blend, (BlendFactor::SrcAlpha, BlendFactor::One));
    assert_eq!(draws[2].blend, (BlendFactor::SrcAlpha, BlendFactor::One));
}

#[test]
fn blend_gl() {
    let mut state = setup();
    state.set_blend_gl(0x0302, 1).unwrap();
    assert_eq!(state.blend(), (BlendFactor::SrcAlpha, BlendFactor::One));
    assert!(state.set_blend_gl(0x1234, 1).is_err());
    assert_eq!(state.blend(), (BlendFactor::SrcAlpha, BlendFactor::One));

    state.set_blend_gl(1, 0x0303).unwrap();
    assert_eq!(state.blend(), DEFAULT_BLEND);
}

#[test]
fn drawcall_counter() {
    let mut state = setup();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.flush().unwrap();
    state.reset_drawcall_count();
    state.device_mut().clear_commands();
    assert_eq!(state.drawcall_count(), 0);

    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.set_program(2).unwrap();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.set_texture(0, TextureHandle::new(1)).unwrap();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.set_blend(BlendFactor::DstColor, BlendFactor::Zero).unwrap();

    // State changes without anything batched.
    state.set_program(0).unwrap();
    state.set_texture(0, None).unwrap();

    assert_eq!(state.drawcall_count(), 3);
    assert_eq!(state.device().draws().len(), 3);
}

#[test]
fn program() {
    let mut state = setup();
    assert!(state.set_program(16).is_err());
    assert!(state.set_program(3).is_err());
    assert_eq!(state.current_program(), Some(0));

    state.set_program(0).unwrap();
    assert_eq!(state.device().commands().len(), 0);

    state.set_program(1).unwrap();
    assert_eq!(state.current_program(), Some(1));
    assert_eq!(state.device().commands().len(), 1);
}

#[test]
fn load_and_unload() {
    let mut state = setup();
    let (_, _, shaders) = state.device().live_objects();
    assert_eq!(shaders, 3);

    // Replacing a program releases the previous shader.
    state.load_program(0, VS, FS, 1).unwrap();
    assert_eq!(state.device().live_objects().2, 3);
    assert_eq!(state.current_program(), None);
    assert!(state.load_program(0, VS, FS, 9).is_err());
    assert!(state.load_program(16, VS, FS, 1).is_err());
    assert!(state.load_program(0, "", FS, 1).is_err());
    assert!(state.set_program(0).is_err());

    state.set_program(1).unwrap();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.unload_program(1).unwrap();
    assert_eq!(state.drawcall_count(), 1);
    assert_eq!(state.current_program(), None);
    assert_eq!(state.device().live_objects().2, 1);
    assert!(state.set_program(1).is_err());
}

#[test]
fn texture() {
    let mut state = setup();
    let t = TextureHandle::new(3);
    assert!(state.set_texture(8, t).is_err());

    state.set_texture(7, t).unwrap();
    state.set_texture(7, t).unwrap();
    assert_eq!(state.texture(7), t);
    assert_eq!(state.device().bound_texture(7), t);
    assert_eq!(state.device().commands().len(), 1);
}

#[test]
fn clear_and_scissor() {
    let mut state = setup();
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.clear(0xFF20_4060).unwrap();
    assert_eq!(state.drawcall_count(), 1);

    state.scissor_test(true).unwrap();
    assert!(state.device().scissor());

    let cmds = state.device().commands();
    assert_eq!(cmds[cmds.len() - 2], Command::Clear(0xFF20_4060));
    assert_eq!(cmds[cmds.len() - 1], Command::EnableScissor(true));
}

#[test]
fn reset() {
    let mut state = setup();
    let t = TextureHandle::new(5);
    state.set_texture(0, t).unwrap();
    state.set_blend(BlendFactor::SrcAlpha, BlendFactor::One).unwrap();
    let shader = state.device().bound_shader();

    state.device_mut().reset_state().unwrap();
    assert_eq!(state.device().bound_shader(), None);

    state.reset().unwrap();
    assert_eq!(state.device().bound_shader(), shader);
    assert_eq!(state.device().bound_texture(0), t);
    assert_eq!(state.device().blend(), DEFAULT_BLEND);
    assert_eq!(state.blend(), DEFAULT_BLEND);

    // The device is able to draw again.
    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.flush().unwrap();
    assert_eq!(state.device().draws().len(), 1);
}

#[test]
fn draw_buffer() {
    let mut state = setup();
    let screen = Screen::new(200.0, 100.0, 1.0);

    let handle = TextureHandle::new(9).unwrap();
    let mut textures = TextureTable::new();
    textures.insert(TextureId(1), handle);

    let mut buffer = RenderBuffer::new(8);
    buffer.set_texture(Some(TextureId(1)));
    buffer.add(&quad(), 0xFFFF_FFFF, 0).unwrap();
    buffer.add(&quad(), 0xFFFF_FFFF, 0).unwrap();

    // Not uploaded yet.
    assert!(!state
        .draw_buffer(&buffer, 0.0, 0.0, 1.0, &textures, &screen)
        .unwrap());

    state.upload_buffer(&mut buffer).unwrap();
    let gpu = buffer.gpu_buffer().unwrap();

    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.device_mut().clear_commands();
    assert!(state
        .draw_buffer(&buffer, 100.0, 50.0, 2.0, &textures, &screen)
        .unwrap());

    // The pending quad, then the buffer.
    assert_eq!(state.drawcall_count(), 2);
    assert_eq!(state.current_program(), Some(1));
    assert_eq!(state.texture(0), Some(handle));

    let draws = state.device().draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[1].vertex_buffer, Some(gpu));
    assert_eq!(draws[1].count, 12);
    assert_eq!(draws[1].textures[0], Some(handle));

    let st: Vec<_> = state
        .device()
        .commands()
        .iter()
        .filter_map(|v| match *v {
            Command::SetUniform(_, UniformFormat::Vector4f, ref v) => Some(v.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(st, vec![vec![0.02, -0.04, 1.0, -1.0]]);

    // The shared vertex buffer is bound again.
    match state.device().commands().last() {
        Some(Command::BindVertexBuffer(v)) => assert_ne!(*v, gpu),
        _ => panic!("the shared vertex buffer is not rebound"),
    }

    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.flush().unwrap();
    assert_ne!(state.device().draws()[2].vertex_buffer, Some(gpu));
}

#[test]
fn draw_buffer_texture_not_ready() {
    let mut state = setup();
    let mut buffer = RenderBuffer::new(4);
    buffer.set_texture(Some(TextureId(7)));
    buffer.add(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.upload_buffer(&mut buffer).unwrap();

    state.device_mut().clear_commands();
    let drawn = state
        .draw_buffer(&buffer, 0.0, 0.0, 1.0, &TextureTable::new(), &Screen::default())
        .unwrap();

    assert!(!drawn);
    assert_eq!(state.drawcall_count(), 0);
    assert!(state.device().commands().is_empty());

    state.release_buffer(&mut buffer).unwrap();
    assert!(buffer.gpu_buffer().is_none());
}

#[test]
fn destroy() {
    let mut state = setup();
    let mut buffer = RenderBuffer::new(4);
    buffer.add(&quad(), 0xFFFF_FFFF, 0).unwrap();
    state.upload_buffer(&mut buffer).unwrap();
    state.release_buffer(&mut buffer).unwrap();

    state.draw(&quad(), 0xFFFF_FFFF, 0).unwrap();
    let device = state.destroy().unwrap();

    assert_eq!(device.live_objects(), (0, 0, 0));
    assert_eq!(device.draws().len(), 1);
}
