use crate::ui::theme::{style, Tone};
use crate::ui::Icons;
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::DATABASE, text.style(style(Tone::Header)));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(style(Tone::Success)));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(style(Tone::Error)));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(style(Tone::Warn)));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(style(Tone::Info)),
        label.style(style(Tone::Dim)),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(style(Tone::Header)));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(style(Tone::Dim)), value);
}
