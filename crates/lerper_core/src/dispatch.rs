//! # Draw Dispatch
//!
//! Turns a playback position into per-entity draw calls.

use crate::frame::Frame;

/// Receives one call per drawable entity during a draw.
///
/// `previous` is the entity in the frame playback is leaving, `next` the
/// same entity in the frame it is heading to, and `fraction` the blend
/// between them: 0 is fully `previous`, 1 fully `next`. With nothing
/// queued, `previous` and `next` are the same snapshot.
///
/// Implemented for every `FnMut(&T, &T, f32)`.
pub trait EntityDraw<T> {
    /// Draws one entity.
    fn draw_entity(&mut self, previous: &T, next: &T, fraction: f32);
}

impl<T, F> EntityDraw<T> for F
where
    F: FnMut(&T, &T, f32),
{
    #[inline]
    fn draw_entity(&mut self, previous: &T, next: &T, fraction: f32) {
        self(previous, next, fraction);
    }
}

/// Calls `sink` for every entity drawable between `current` and `target`.
///
/// With a target, only ids present in both frames are drawn: entities that
/// just disappeared or just appeared are skipped. Without a target every
/// entity in `current` is drawn in place.
///
/// Returns the number of calls made.
pub fn dispatch<T, D>(current: &Frame<T>, target: Option<&Frame<T>>, fraction: f32, sink: &mut D) -> usize
where
    D: EntityDraw<T> + ?Sized,
{
    let mut drawn = 0;
    match target {
        Some(target) => {
            for (id, from) in current.iter() {
                if let Some(to) = target.get(id) {
                    sink.draw_entity(from, to, fraction);
                    drawn += 1;
                }
            }
        }
        None => {
            for (_, snapshot) in current.iter() {
                sink.draw_entity(snapshot, snapshot, fraction);
                drawn += 1;
            }
        }
    }
    drawn
}
