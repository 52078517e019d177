use colored::Colorize;

use posekit_core::{
    ApplyReport, LimbOutcome, MirrorReport, PasteReport, SnapReport, WriteOutcome,
};

/// Prints the outcome of an apply pass.
pub(crate) fn print_apply_report(report: &ApplyReport) {
    println!(
        "  {} {} attribute(s) written",
        "->".green(),
        report.written()
    );
    if report.reset_controls > 0 {
        println!("  {} {} control(s) reset", "->".green(), report.reset_controls);
    }
    if report.keyed_controls > 0 {
        println!("  {} {} control(s) keyed", "->".green(), report.keyed_controls);
    }
    if report.partial_matches() > 0 {
        println!(
            "  {} {} attribute(s) not on the live rig",
            "!".yellow(),
            report.partial_matches()
        );
    }
    for control in &report.missing_controls {
        println!("  {} missing control {}", "!".yellow(), control);
    }
    for write in &report.writes {
        if let WriteOutcome::Failed(message) = &write.outcome {
            println!(
                "  {} {}.{}: {}",
                "x".red(),
                write.control,
                write.attribute,
                message
            );
        }
    }

    if let Some(reconcile) = &report.reconcile {
        for (limb, outcome) in &reconcile.limbs {
            match outcome {
                LimbOutcome::Unchanged => {}
                LimbOutcome::Matched { from, to } => {
                    println!("  {} {} matched {} -> {}", "->".green(), limb, from, to)
                }
                LimbOutcome::MatchFailed(message) | LimbOutcome::Failed(message) => {
                    println!("  {} {}: {}", "x".red(), limb, message)
                }
            }
        }
    }
}

/// Prints the outcome of a mirror pass.
pub(crate) fn print_mirror_report(report: &MirrorReport) {
    if let Some(apply) = &report.apply {
        print_apply_report(apply);
    }
    println!(
        "  {} {} control(s) mirrored, {} kept",
        "->".green(),
        report.mirrored.len(),
        report.kept.len()
    );
    if report.swapped > 0 {
        println!("  {} {} paired attribute(s) swapped", "->".green(), report.swapped);
    }
    for control in &report.unsupported {
        println!(
            "  {} no mirror rule for {} (rotation copied)",
            "!".yellow(),
            control
        );
    }
    for control in &report.missing {
        println!("  {} missing counterpart {}", "!".yellow(), control);
    }
    for (control, message) in &report.failures {
        println!("  {} {}: {}", "x".red(), control, message);
    }
}

/// Prints the outcome of a paste-opposite pass.
pub(crate) fn print_paste_report(report: &PasteReport) {
    println!(
        "  {} {} attribute(s) pasted",
        "->".green(),
        report.written()
    );
    if !report.central.is_empty() {
        println!(
            "  {} {} central control(s) left alone",
            "->".dimmed(),
            report.central.len()
        );
    }
    for control in &report.missing {
        println!("  {} missing opposite control {}", "!".yellow(), control);
    }
}

/// Prints the outcome of a snap.
pub(crate) fn print_snap_report(report: &SnapReport) {
    println!(
        "  {} {} control(s) snapped, {} repositioned, {} keyed",
        "->".green(),
        report.snapped,
        report.repositioned,
        report.keyed
    );
    for (control, message) in &report.failures {
        println!("  {} {}: {}", "x".red(), control, message);
    }
}
