use crate::command::PaintCommand;
use crate::frame::TargetState;

/// Commands that turn `previous` into `next`, one per changed pixel, by ascending position.
pub fn diff(previous: &TargetState, next: &TargetState) -> Vec<PaintCommand> {
    previous
        .pixels()
        .iter()
        .zip(next.pixels().iter())
        .enumerate()
        .filter(|(_, (old, new))| old != new)
        .map(|(position, (_, &new))| {
            // NUM_PIXELS is 256, positions always fit
            PaintCommand::new(position as u8, crate::color::decode(new))
        })
        .collect()
}
