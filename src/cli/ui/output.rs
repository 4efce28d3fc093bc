use console::style;

use crate::types::{ConsensusDescription, ProcessingResult};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Human-readable rendering of one extraction result
    pub fn result(&self, result: &ProcessingResult, limit: Option<usize>) {
        self.header(&format!(
            "{} description(s) · mode {} · {} ms",
            result.descriptions.len(),
            result.mode,
            result.elapsed_ms
        ));

        let shown = limit.unwrap_or(result.descriptions.len());
        for (rank, description) in result.descriptions.iter().take(shown).enumerate() {
            self.description(rank + 1, description);
        }
        if shown < result.descriptions.len() {
            self.info(&format!("{} more not shown", result.descriptions.len() - shown));
        }

        self.section("Run");
        println!(
            "  Consensus rate:  {:.0}% ({}/{} groups)",
            result.metrics.consensus_rate * 100.0,
            result.metrics.accepted_count,
            result.metrics.group_count
        );
        println!("  Mean confidence: {:.2}", result.metrics.mean_confidence);
        println!(
            "  Engines used:    {}",
            result.engines_used.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        for (engine, reason) in &result.failed_engines {
            self.warning(&format!("{}: {}", engine, reason));
        }
    }

    fn description(&self, rank: usize, d: &ConsensusDescription) {
        println!(
            "\n{} {} {} {}",
            style(format!("#{}", rank)).bold(),
            style(d.description_type.as_str()).cyan(),
            style(format!("[{}..{}]", d.start, d.end)).dim(),
            style(format!(
                "priority {:.1} · confidence {:.2} · {} vote(s)",
                d.priority_score,
                d.confidence,
                d.votes.len()
            ))
            .dim()
        );
        println!("  {}", excerpt(&d.text, 240));
        if !d.entity_mentions.is_empty() {
            let entities: Vec<&str> = d.entity_mentions.iter().map(String::as_str).collect();
            println!("  {} {}", style("entities:").dim(), entities.join(", "));
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// First `max_chars` characters on one line, with an ellipsis when cut
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_flattens_and_cuts() {
        assert_eq!(excerpt("a\n\nb   c", 10), "a b c");
        assert_eq!(excerpt("abcdef ghij", 7), "abcdef…");
    }
}
