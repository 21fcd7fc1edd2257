use crate::command::PaintCommand;
use crate::frame::CanvasFrame;
use crate::frame::FrameError;
use crate::frame::TargetState;
use crate::queue::CommandQueue;

/// The latest target and the commands still owed to the device.
///
/// The target is replaced as soon as a frame is ingested, not when the device confirms the paint,
/// so queued commands may belong to an older target.
#[derive(Debug, Default)]
pub struct DisplayState {
    target: TargetState,
    queue: CommandQueue,
    skip_superseded: bool,
    skipped: u64,
}

impl DisplayState {
    pub fn new(skip_superseded: bool) -> Self {
        Self {
            skip_superseded,
            ..Self::default()
        }
    }

    /// Diff `frame` against the current target, queue the changes and make it the new target.
    ///
    /// Returns the number of queued commands. An invalid frame leaves everything untouched.
    pub fn ingest(&mut self, frame: &CanvasFrame) -> Result<usize, FrameError> {
        let next = TargetState::from_frame(frame)?;
        let commands = crate::diff::diff(&self.target, &next);
        let enqueued = commands.len();

        self.queue.append(commands);
        self.target = next;

        tracing::debug!(enqueued, queue_len = self.queue.len(), "Ingested frame");
        Ok(enqueued)
    }

    /// Next command to dispatch, in FIFO order.
    ///
    /// With `skip_superseded`, commands whose color no longer matches the target at their position
    /// are dropped; a newer command for the same pixel is always queued behind them.
    pub fn next_command(&mut self) -> Option<PaintCommand> {
        while let Some(command) = self.queue.pop_front() {
            if self.skip_superseded && self.is_superseded(&command) {
                self.skipped += 1;
                tracing::trace!(%command, "Skipping superseded command");
                continue;
            }

            return Some(command);
        }

        None
    }

    fn is_superseded(&self, command: &PaintCommand) -> bool {
        self.target
            .get(usize::from(command.position))
            .map(crate::color::decode)
            .is_some_and(|color| color != command.color)
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    #[cfg(test)]
    pub fn target(&self) -> &TargetState {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use rgb::RGB8;

    use super::DisplayState;
    use crate::color::PackedColor;
    use crate::command::PaintCommand;
    use crate::frame::CanvasFrame;
    use crate::frame::FrameError;
    use crate::frame::HEIGHT;
    use crate::frame::WIDTH;

    fn frame_with(cells: &[((usize, usize), PackedColor)]) -> CanvasFrame {
        let mut rows = vec![vec![0; WIDTH]; HEIGHT];
        for &((x, y), color) in cells {
            rows[y][x] = color;
        }
        CanvasFrame::new(rows)
    }

    fn drain(state: &mut DisplayState) -> Vec<PaintCommand> {
        std::iter::from_fn(|| state.next_command()).collect()
    }

    #[test]
    fn test_black_frame_on_black_target_queues_nothing() {
        let mut state = DisplayState::default();
        assert_eq!(state.ingest(&frame_with(&[])), Ok(0));
        assert!(!state.has_pending());
        assert_eq!(state.next_command(), None);
    }

    #[test]
    fn test_red_corner_queues_single_command() {
        let mut state = DisplayState::default();
        assert_eq!(state.ingest(&frame_with(&[((0, 0), 16_711_680)])), Ok(1));
        assert_eq!(
            state.next_command(),
            Some(PaintCommand::new(255, RGB8::new(255, 0, 0)))
        );
    }

    #[test]
    fn test_back_to_back_frames_keep_frame_order() {
        let mut state = DisplayState::default();

        // frame 1: (0, 0) red, (1, 0) green
        state
            .ingest(&frame_with(&[((0, 0), 0xFF_0000), ((1, 0), 0x00_FF00)]))
            .unwrap();
        // frame 2: (0, 0) blue, (1, 0) back to black, (2, 0) green
        state
            .ingest(&frame_with(&[((0, 0), 0x00_00FF), ((2, 0), 0x00_FF00)]))
            .unwrap();

        let positions_and_colors: Vec<(u8, RGB8)> = drain(&mut state)
            .into_iter()
            .map(|c| (c.position, c.color))
            .collect();

        assert_eq!(
            positions_and_colors,
            vec![
                // diff against the initial black target
                (254, RGB8::new(0, 255, 0)),
                (255, RGB8::new(255, 0, 0)),
                // diff against frame 1
                (253, RGB8::new(0, 255, 0)),
                (254, RGB8::new(0, 0, 0)),
                (255, RGB8::new(0, 0, 255)),
            ]
        );
    }

    #[test]
    fn test_invalid_frame_leaves_state_untouched() {
        let mut state = DisplayState::default();
        state.ingest(&frame_with(&[((4, 4), 0x00_00FF)])).unwrap();
        let before = state.target().clone();
        let pending = state.pending();

        let result = state.ingest(&CanvasFrame::new(vec![vec![0xFF; WIDTH]; 3]));

        assert_eq!(result, Err(FrameError::RowCount(3)));
        assert_eq!(state.target(), &before);
        assert_eq!(state.pending(), pending);
    }

    #[test]
    fn test_skip_superseded_drops_overwritten_pixels() {
        let mut state = DisplayState::new(true);
        state.ingest(&frame_with(&[((0, 0), 0xFF_0000)])).unwrap();
        state.ingest(&frame_with(&[((0, 0), 0x00_00FF)])).unwrap();

        assert_eq!(
            drain(&mut state),
            vec![PaintCommand::new(255, RGB8::new(0, 0, 255))]
        );
        assert_eq!(state.skipped(), 1);
    }

    #[test]
    fn test_skip_superseded_keeps_final_revert() {
        let mut state = DisplayState::new(true);
        state.ingest(&frame_with(&[((0, 0), 0xFF_0000)])).unwrap();
        state.ingest(&frame_with(&[])).unwrap();

        assert_eq!(
            drain(&mut state),
            vec![PaintCommand::new(255, RGB8::new(0, 0, 0))]
        );
    }

    #[test]
    fn test_default_never_skips() {
        let mut state = DisplayState::default();
        state.ingest(&frame_with(&[((0, 0), 0xFF_0000)])).unwrap();
        state.ingest(&frame_with(&[((0, 0), 0x00_00FF)])).unwrap();

        assert_eq!(drain(&mut state).len(), 2);
        assert_eq!(state.skipped(), 0);
    }
}
