/// Render the sweeping activity glyph for `tick` across `width` positions.
///
/// The marker moves right for `width` ticks, then left for `width` ticks, so
/// the glyph repeats every `2 * width` ticks. A zero width renders as `[=]`.
pub fn render(tick: u64, width: usize) -> String {
    if width == 0 {
        return "[=]".to_string();
    }
    let width = width as u64;
    let cycle = tick / width;
    let before = if cycle % 2 == 0 {
        tick % width
    } else {
        width - (tick % width)
    };
    let after = width - before;
    format!(
        "[{}={}]",
        " ".repeat(before as usize),
        " ".repeat(after as usize)
    )
}
