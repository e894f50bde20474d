//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Build
//!
//! One line per copied static item and per written page, in the order the
//! build produced them:
//!
//! ```text
//! Copied: assets/ (3 files)
//! Copied: robots.txt
//! Built: dist/about/index.html
//! Built: dist/index.html
//! Build complete: 2 pages, 2 static items
//! ```
//!
//! ## Check
//!
//! ```text
//! Pages
//! 001 about → dist/about/index.html
//!     Includes: templates/partials/header.html
//!
//! Static
//!     assets
//!     CNAME (missing)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! Build events arrive on a channel while the build runs, so they are
//! written by [`EventPrinter`], a thread draining the channel.

use crate::mirror::MirroredItem;
use crate::pipeline::{BuildEvent, CheckReport};
use crate::router::RouteKind;
use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn copied_line(item: &MirroredItem) -> String {
    if item.is_dir {
        format!("Copied: {}/ ({} files)", item.name, item.files)
    } else {
        format!("Copied: {}", item.name)
    }
}

/// Format a single build event as display lines.
///
/// Phase changes print nothing; they only matter to `--verbose` tracing.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::PhaseStarted(_) => Vec::new(),
        BuildEvent::Copied(item) => vec![copied_line(item)],
        BuildEvent::Built(page) => vec![format!("Built: {}", page.output.display())],
        BuildEvent::Finished {
            pages,
            static_items,
        } => vec![format!(
            "Build complete: {} {}, {} static {}",
            pages,
            if *pages == 1 { "page" } else { "pages" },
            static_items,
            if *static_items == 1 { "item" } else { "items" },
        )],
    }
}

/// Write every event from `events` until the sending side is dropped.
pub fn write_build_events(events: Receiver<BuildEvent>, out: &mut impl Write) -> io::Result<()> {
    for event in events {
        for line in format_build_event(&event) {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}

/// Background thread printing build events to stdout.
pub struct EventPrinter {
    handle: JoinHandle<io::Result<()>>,
}

impl EventPrinter {
    pub fn spawn(events: Receiver<BuildEvent>) -> Self {
        Self::spawn_with(move || write_build_events(events, &mut io::stdout().lock()))
    }

    fn spawn_with(print: impl FnOnce() -> io::Result<()> + Send + 'static) -> Self {
        Self {
            handle: thread::spawn(print),
        }
    }

    /// Wait for the channel to drain. A write error or a panic on the
    /// printer thread comes back as an error.
    pub fn finish(self) -> io::Result<()> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(io::Error::other(
                "build log printer panicked; the log above is incomplete",
            )),
        }
    }
}

/// Format the result of `check`.
pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];

    for (i, page) in report.pages.iter().enumerate() {
        let marker = match page.kind {
            RouteKind::Home => " (home)",
            RouteKind::FlatPage => " (flat)",
            RouteKind::DefaultPage => "",
        };
        lines.push(format!(
            "{} {}{} \u{2192} {}",
            format_index(i + 1),
            page.base_name,
            marker,
            page.output.display()
        ));
        for include in &page.includes {
            lines.push(format!("    Includes: {include}"));
        }
    }

    lines.push(String::new());
    lines.push("Static".to_string());
    for (name, present) in &report.static_items {
        if *present {
            lines.push(format!("    {name}"));
        } else {
            lines.push(format!("    {name} (missing)"));
        }
    }

    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{BuildState, BuiltPage, PagePlan};
    use std::path::PathBuf;

    #[test]
    fn phase_events_are_silent() {
        assert!(format_build_event(&BuildEvent::PhaseStarted(BuildState::Clearing)).is_empty());
    }

    #[test]
    fn copied_lines_show_file_counts_for_directories() {
        let dir = BuildEvent::Copied(MirroredItem {
            name: "assets".into(),
            is_dir: true,
            files: 3,
        });
        let file = BuildEvent::Copied(MirroredItem {
            name: "CNAME".into(),
            is_dir: false,
            files: 1,
        });
        assert_eq!(format_build_event(&dir), ["Copied: assets/ (3 files)"]);
        assert_eq!(format_build_event(&file), ["Copied: CNAME"]);
    }

    #[test]
    fn built_line_shows_output_path() {
        let event = BuildEvent::Built(BuiltPage {
            source: "about.src.html".into(),
            base_name: "about".into(),
            output: PathBuf::from("dist/about/index.html"),
            kind: RouteKind::DefaultPage,
        });
        assert_eq!(format_build_event(&event), ["Built: dist/about/index.html"]);
    }

    #[test]
    fn finished_line_pluralises() {
        let one = BuildEvent::Finished {
            pages: 1,
            static_items: 1,
        };
        let many = BuildEvent::Finished {
            pages: 4,
            static_items: 0,
        };
        assert_eq!(
            format_build_event(&one),
            ["Build complete: 1 page, 1 static item"]
        );
        assert_eq!(
            format_build_event(&many),
            ["Build complete: 4 pages, 0 static items"]
        );
    }

    #[test]
    fn build_events_are_written_in_order() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(BuildEvent::PhaseStarted(BuildState::Mirroring)).unwrap();
        tx.send(BuildEvent::Copied(MirroredItem {
            name: "robots.txt".into(),
            is_dir: false,
            files: 1,
        }))
        .unwrap();
        tx.send(BuildEvent::Finished {
            pages: 0,
            static_items: 1,
        })
        .unwrap();
        drop(tx);

        let mut out = Vec::new();
        write_build_events(rx, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Copied: robots.txt\nBuild complete: 0 pages, 1 static item\n"
        );
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_returned() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(BuildEvent::Finished {
            pages: 1,
            static_items: 0,
        })
        .unwrap();
        drop(tx);

        let err = write_build_events(rx, &mut ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn printer_panic_is_reported_on_finish() {
        let printer = EventPrinter::spawn_with(|| panic!("printer died"));
        let err = printer.finish().unwrap_err();
        assert!(err.to_string().contains("printer panicked"));
    }

    #[test]
    fn printer_write_error_is_reported_on_finish() {
        let printer =
            EventPrinter::spawn_with(|| Err(io::Error::from(io::ErrorKind::BrokenPipe)));
        assert_eq!(
            printer.finish().unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn check_output_lists_pages_and_statics() {
        let report = CheckReport {
            pages: vec![
                PagePlan {
                    source: "about.src.html".into(),
                    base_name: "about".into(),
                    output: PathBuf::from("dist/about/index.html"),
                    kind: RouteKind::DefaultPage,
                    includes: vec!["templates/partials/header.html".into()],
                },
                PagePlan {
                    source: "index.src.html".into(),
                    base_name: "index".into(),
                    output: PathBuf::from("dist/index.html"),
                    kind: RouteKind::Home,
                    includes: vec![],
                },
            ],
            static_items: vec![("assets".into(), true), ("CNAME".into(), false)],
        };

        assert_eq!(
            format_check_output(&report),
            [
                "Pages",
                "001 about \u{2192} dist/about/index.html",
                "    Includes: templates/partials/header.html",
                "002 index (home) \u{2192} dist/index.html",
                "",
                "Static",
                "    assets",
                "    CNAME (missing)",
            ]
        );
    }
}
