use randexp::Generation;

const COLOR_START: &str = "\x1b[01;31m";
const COLOR_RESET: &str = "\x1b[m";

pub fn maybe_colorize(
    s: &str,
    use_color: bool,
) -> String {
    if use_color {
        format!("{COLOR_START}{s}{COLOR_RESET}")
    } else {
        s.to_string()
    }
}

/// One output line: the string, then optionally a tab and its decision log.
pub fn format_generation(
    generation: &Generation,
    show_log: bool,
    use_color: bool,
) -> String {
    if show_log {
        let log = maybe_colorize(&generation.decisions.to_string(), use_color);
        format!("{}\t{log}", generation.output)
    } else {
        generation.output.clone()
    }
}
