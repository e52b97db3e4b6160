//! Console formatting helpers: box header/separator, status markers,
//! and human-readable byte/duration formatting.

const WIDTH: usize = 69;

pub fn print_box_header(title: &str) {
    println!();
    println!("+{}+", "-".repeat(WIDTH));
    let pad = (WIDTH.saturating_sub(title.len())) / 2;
    let right_pad = WIDTH.saturating_sub(pad + title.len());
    println!("|{}{}{}|", " ".repeat(pad), title, " ".repeat(right_pad));
    println!("+{}+", "-".repeat(WIDTH));
    println!();
}

pub fn print_separator() {
    println!("{}", "-".repeat(WIDTH));
}

pub fn print_success(msg: &str) {
    println!("  [ok] {}", msg);
}

pub fn print_error(msg: &str) {
    eprintln!("  [error] {}", msg);
}

pub fn print_warning(msg: &str) {
    println!("  [warn] {}", msg);
}

pub fn print_info(msg: &str) {
    println!("  [info] {}", msg);
}

/// Format bytes into a human-readable size string.
pub fn format_bytes(bytes: u64) -> String {
    const GB: u64 = 1_073_741_824;
    const MB: u64 = 1_048_576;
    const KB: u64 = 1_024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Format a duration in seconds (fractional) as `Xs`/`Xm Ys` etc.
pub fn format_duration_secs(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor();
        let rem = secs - mins * 60.0;
        format!("{mins:.0}m {rem:.1}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes_at_each_scale() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1_048_576), "5.0 MB");
    }
}
