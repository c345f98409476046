//! Decomposes a polygon fan into quads, so polygons could share the fixed quad
//! index pattern of the batch.

use crate::errors::*;

/// Iterates the quads covering a fan of `n` vertices. Every quad is anchored at vertex
/// 0 and the fan advances by 2 vertices per quad. Indices past the end are clamped to
/// `n - 1`, so short tails produce quads with repeated vertices.
///
/// ```rust
/// use crayon_batch::render::QuadFan;
///
/// let quads: Vec<_> = QuadFan::new(7).unwrap().collect();
/// assert_eq!(quads, vec![[0, 1, 2, 3], [0, 3, 4, 5], [0, 5, 6, 6]]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QuadFan {
    n: usize,
    i: usize,
}

impl QuadFan {
    pub fn new(n: usize) -> Result<Self> {
        if n < 3 {
            return Err(Error::PolygonTooSmall(n));
        }

        Ok(QuadFan { n, i: 0 })
    }
}

impl Iterator for QuadFan {
    type Item = [usize; 4];

    fn next(&mut self) -> Option<Self::Item> {
        if self.i + 2 >= self.n {
            return None;
        }

        let last = self.n - 1;
        let i = self.i;
        self.i += 2;

        Some([0, i + 1, (i + 2).min(last), (i + 3).min(last)])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = if self.i + 2 >= self.n {
            0
        } else {
            (self.n - 2 - self.i + 1) / 2
        };

        (len, Some(len))
    }
}

impl ExactSizeIterator for QuadFan {}

#[cfg(test)]
mod test {
    use super::*;

    fn quads(n: usize) -> Vec<[usize; 4]> {
        QuadFan::new(n).unwrap().collect()
    }

    #[test]
    fn fan() {
        assert_eq!(quads(3), vec![[0, 1, 2, 2]]);
        assert_eq!(quads(4), vec![[0, 1, 2, 3]]);
        assert_eq!(quads(5), vec![[0, 1, 2, 3], [0, 3, 4, 4]]);
        assert_eq!(quads(6), vec![[0, 1, 2, 3], [0, 3, 4, 5]]);
        assert_eq!(quads(7), vec![[0, 1, 2, 3], [0, 3, 4, 5], [0, 5, 6, 6]]);
    }

    #[test]
    fn len() {
        for n in 3..64 {
            let fan = QuadFan::new(n).unwrap();
            let len = fan.len();
            let quads: Vec<_> = fan.collect();
            assert_eq!(quads.len(), len);

            for q in &quads {
                assert!(q.iter().all(|&v| v < n));
            }

            // Every vertex is covered.
            for v in 0..n {
                assert!(quads.iter().any(|q| q.contains(&v)));
            }
        }
    }

    #[test]
    fn too_small() {
        assert!(QuadFan::new(0).is_err());
        assert!(QuadFan::new(2).is_err());
    }
}
