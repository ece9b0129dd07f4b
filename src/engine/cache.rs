//! Per-wall vertex cache.
//!
//! Each wall owns one CPU-side float buffer and (once uploaded) one backend
//! buffer. Every frame the fresh projection is written through
//! [`set_slot`](crate::world::set_slot); only a real difference triggers a
//! whole-buffer re-upload. There is no sub-range diffing.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    engine::types::ProjectedQuad,
    renderer::{BufferData, BufferHandle, BufferTarget, DrawBackend, Usage},
    world::WallId,
};

/// Cached render record of one wall.
#[derive(Debug, Default)]
pub struct CacheEntry {
    content: Vec<f32>,
    buffer: Option<BufferHandle>,
    changed: bool,
}

impl CacheEntry {
    fn with_len(len: usize) -> Self {
        Self {
            content: vec![0.0; len],
            buffer: None,
            changed: false,
        }
    }

    /// Floats last written for this wall.
    pub fn content(&self) -> &[f32] {
        &self.content
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    /// Whether the most recent refresh found a difference.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

/// Result of [`GeometryCache::refresh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Refresh {
    pub buffer: BufferHandle,
    pub uploaded: bool,
}

#[derive(Debug, Default)]
pub struct GeometryCache {
    entries: HashMap<WallId, CacheEntry>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: WallId) -> Option<&CacheEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the record of a wall that left the level. Returns the backend
    /// buffer it owned, if one was ever created.
    pub fn remove(&mut self, id: WallId) -> Option<BufferHandle> {
        self.entries.remove(&id).and_then(|e| e.buffer)
    }

    /// Bring wall `id` up to date with `quad`.
    ///
    /// * First sight allocates a `len`-float buffer.
    /// * Unchanged content with an existing backend buffer is a no-op.
    /// * Otherwise the backend buffer is created if needed, bound to
    ///   [`BufferTarget::Array`] and fully re-uploaded.
    pub fn refresh<B: DrawBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: WallId,
        len: usize,
        quad: &ProjectedQuad,
    ) -> Refresh {
        let entry = self
            .entries
            .entry(id)
            .or_insert_with(|| CacheEntry::with_len(len));
        if entry.content.len() != len {
            entry.content.resize(len, 0.0);
        }

        entry.changed = quad.write_into(&mut entry.content);

        if let Some(buffer) = entry.buffer {
            if !entry.changed {
                return Refresh {
                    buffer,
                    uploaded: false,
                };
            }
        }

        let buffer = *entry.buffer.get_or_insert_with(|| backend.create_buffer());
        backend.bind_buffer(BufferTarget::Array, Some(buffer));
        backend.upload_data(
            BufferTarget::Array,
            BufferData::F32(&entry.content),
            Usage::Static,
        );
        debug!(wall = id.0, buffer = buffer.0, "vertex buffer uploaded");

        Refresh {
            buffer,
            uploaded: true,
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::types::{Vertex, WALL_BUFFER_LEN},
        renderer::Recording,
    };

    fn quad(x: f32) -> ProjectedQuad {
        let v = |dx: f32, y: f32| Vertex {
            x: x + dx,
            y,
            color: 1.0,
        };
        ProjectedQuad::from_corners([v(0.0, 10.0), v(5.0, 10.0), v(0.0, 20.0), v(5.0, 20.0)])
    }

    #[test]
    fn first_refresh_creates_and_uploads() {
        let mut rec = Recording::new();
        let mut cache = GeometryCache::new();
        let r = cache.refresh(&mut rec, WallId(7), WALL_BUFFER_LEN, &quad(12.0));
        assert!(r.uploaded);
        assert_eq!(rec.upload_count(BufferTarget::Array), 1);
        assert_eq!(cache.get(WallId(7)).unwrap().content().len(), WALL_BUFFER_LEN);
        assert_eq!(cache.get(WallId(7)).unwrap().buffer(), Some(r.buffer));
    }

    #[test]
    fn unchanged_quad_skips_upload() {
        let mut rec = Recording::new();
        let mut cache = GeometryCache::new();
        cache.refresh(&mut rec, WallId(1), WALL_BUFFER_LEN, &quad(12.0));
        rec.clear();

        let r = cache.refresh(&mut rec, WallId(1), WALL_BUFFER_LEN, &quad(12.0));
        assert!(!r.uploaded);
        assert!(!cache.get(WallId(1)).unwrap().changed());
        assert!(rec.calls().is_empty(), "no-op refresh touched the backend");
    }

    #[test]
    fn moved_quad_reuses_buffer() {
        let mut rec = Recording::new();
        let mut cache = GeometryCache::new();
        let a = cache.refresh(&mut rec, WallId(1), WALL_BUFFER_LEN, &quad(12.0));
        let b = cache.refresh(&mut rec, WallId(1), WALL_BUFFER_LEN, &quad(13.0));
        assert!(b.uploaded);
        assert_eq!(a.buffer, b.buffer);
        assert_eq!(rec.last_vertex_upload().unwrap()[0], 13.0);
    }

    #[test]
    fn all_zero_quad_still_gets_a_buffer() {
        let mut rec = Recording::new();
        let mut cache = GeometryCache::new();
        let zero = ProjectedQuad::from_corners(
            [Vertex {
                x: 0.0,
                y: 0.0,
                color: 0.0,
            }; 4],
        );
        let r = cache.refresh(&mut rec, WallId(3), WALL_BUFFER_LEN, &zero);
        assert!(r.uploaded);
    }

    #[test]
    fn removed_wall_starts_over() {
        let mut rec = Recording::new();
        let mut cache = GeometryCache::new();
        let first = cache.refresh(&mut rec, WallId(4), WALL_BUFFER_LEN, &quad(2.0));

        assert_eq!(cache.remove(WallId(4)), Some(first.buffer));
        assert!(cache.is_empty());
        assert_eq!(cache.remove(WallId(4)), None);

        let again = cache.refresh(&mut rec, WallId(4), WALL_BUFFER_LEN, &quad(2.0));
        assert!(again.uploaded);
        assert_ne!(again.buffer, first.buffer);
    }

    #[test]
    fn walls_keep_separate_buffers() {
        let mut rec = Recording::new();
        let mut cache = GeometryCache::new();
        let a = cache.refresh(&mut rec, WallId(1), WALL_BUFFER_LEN, &quad(1.0));
        let b = cache.refresh(&mut rec, WallId(2), WALL_BUFFER_LEN, &quad(1.0));
        assert_ne!(a.buffer, b.buffer);
        assert_eq!(cache.len(), 2);
    }
}
