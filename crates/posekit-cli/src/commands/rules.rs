//! Rules command implementation
//!
//! Prints the active mirror rule table, or looks up the rule for controls.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::process::ExitCode;

use posekit_core::mirror::RuleMatch;
use posekit_core::MirrorRuleTable;

use crate::config::PosekitConfig;

/// Run the rules command
///
/// # Arguments
/// * `config` - User configuration (mirror rule source)
/// * `controls` - Controls to look up; the whole table is dumped if empty
/// * `output` - File to write the table to instead of stdout
pub fn run(config: &PosekitConfig, controls: &[String], output: Option<&str>) -> Result<ExitCode> {
    let table = config.rule_table()?;

    if !controls.is_empty() {
        for control in controls {
            print_lookup(&table, control);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let json = table.to_json_pretty()?;
    match output {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("Failed to write to: {}", path))?;
            println!("{} Rules written to: {}", "SUCCESS".green().bold(), path);
        }
        None => println!("{}", json),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_lookup(table: &MirrorRuleTable, control: &str) {
    match table.lookup(control, false) {
        RuleMatch::Rule(rule) => println!(
            "{} {} {:?}",
            control,
            format!("[{}]", rule.pattern).dimmed(),
            rule.strategy
        ),
        RuleMatch::CustomModule(_) => println!("{} {}", control, "(custom module)".dimmed()),
        RuleMatch::Unsupported => println!(
            "{} {}",
            control,
            "no rule; rotation is copied unmirrored".yellow()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rules_written_to_file() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("rules.json");
        let config = PosekitConfig::default();
        run(&config, &[], Some(out.to_str().unwrap())).unwrap();

        let table = MirrorRuleTable::from_json(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(table.rule_set(), MirrorRuleTable::builtin().rule_set());
    }
}
