//! Progress reporting for council execution

use colored::Colorize;
use council_application::ProgressNotifier;
use council_domain::{CouncilGraph, ExecutionRecord, Node, NodeRecord, NodeRole, NodeStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

const STAGES: [NodeRole; 3] = [NodeRole::Draft, NodeRole::Critique, NodeRole::Synthesis];

fn stage_display_name(role: NodeRole) -> &'static str {
    match role {
        NodeRole::Draft => "Stage 1: Drafts",
        NodeRole::Critique => "Stage 2: Critiques",
        NodeRole::Synthesis => "Stage 3: Synthesis",
    }
}

fn completion_mark(entry: &NodeRecord) -> String {
    match entry.status {
        NodeStatus::Done if entry.degraded => "~".yellow().to_string(),
        NodeStatus::Done => "v".green().to_string(),
        _ => "x".red().to_string(),
    }
}

/// Reports progress with one indicatif bar per stage
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<NodeRole, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn bars(&self) -> MutexGuard<'_, HashMap<NodeRole, ProgressBar>> {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_graph_start(&self, graph: &CouncilGraph) {
        let mut bars = self.bars();
        bars.clear();
        for role in STAGES {
            let total = graph.nodes_with_role(role).count();
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::stage_style());
            pb.set_prefix(stage_display_name(role).to_string());
            pb.set_message("waiting");
            bars.insert(role, pb);
        }
    }

    fn on_node_start(&self, node: &Node) {
        if let Some(pb) = self.bars().get(&node.role) {
            pb.set_message(format!("running {}", node.backend));
        }
    }

    fn on_node_complete(&self, node: &Node, entry: &NodeRecord) {
        if let Some(pb) = self.bars().get(&node.role) {
            pb.set_message(format!("{} {}", completion_mark(entry), node.backend));
            pb.inc(1);
        }
    }

    fn on_graph_complete(&self, _record: &ExecutionRecord) {
        for (_, pb) in self.bars().drain() {
            pb.finish_and_clear();
        }
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_graph_start(&self, graph: &CouncilGraph) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            "Council convened".bold(),
            graph.len()
        );
    }

    fn on_node_complete(&self, node: &Node, entry: &NodeRecord) {
        let suffix = match (&entry.failure, entry.duration()) {
            (Some(failure), _) => format!(" ({})", failure),
            (None, Some(d)) => format!(" ({:.1}s)", d.as_secs_f64()),
            (None, None) => String::new(),
        };
        eprintln!(
            "  {} {} {}{}",
            completion_mark(entry),
            stage_display_name(node.role).dimmed(),
            node.task_name(),
            suffix
        );
    }

    fn on_graph_complete(&self, record: &ExecutionRecord) {
        eprintln!(
            "{} finished in {:.2}s\n",
            "->".cyan(),
            record.elapsed().as_secs_f64()
        );
    }
}
