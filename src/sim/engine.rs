//! Replicate driver: rejection sampling and output serialization

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::config::Settings;
use crate::core::error::{Result, SimError};
use crate::random::SimRng;

use super::tree::{GrowthParams, SimTree};

/// Event-table header; fixed regardless of configuration.
pub const EVENT_FILE_HEADER: &str = "sim,leftchild,rightchild,abstime,lambdainit,lambdashift,muinit";

/// Rejected attempts allowed per replicate slot before giving up.
const MAX_REJECTIONS: usize = 2000;

/// Produces the requested number of accepted tree replicates and writes
/// them to the tree and event files.
pub struct SimEngine {
    growth: GrowthParams,
    number_of_sims: usize,
    mintaxa: usize,
    maxtaxa: usize,
    min_shifts: usize,
    max_shifts: usize,
    tree_path: PathBuf,
    event_path: PathBuf,
    overwrite: bool,
}

/// Per-replicate counts recorded for a completed run.
#[derive(Debug, Clone, Copy)]
pub struct ReplicateStats {
    pub tips: usize,
    pub shifts: usize,
}

/// Statistics returned by a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub replicates: Vec<ReplicateStats>,
    pub total_rejections: usize,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        let tips: usize = self.replicates.iter().map(|r| r.tips).sum();
        format!(
            "{} replicates, {} tips total, {} rejected attempts",
            self.replicates.len(),
            tips,
            self.total_rejections
        )
    }
}

impl SimEngine {
    pub fn new(settings: &Settings) -> Self {
        Self {
            growth: GrowthParams::from_settings(settings),
            number_of_sims: settings.number_of_sims,
            mintaxa: settings.mintaxa,
            maxtaxa: settings.maxtaxa,
            min_shifts: settings.min_number_of_shifts,
            max_shifts: settings.max_number_of_shifts,
            tree_path: settings.treefile.clone(),
            event_path: settings.eventfile.clone(),
            overwrite: settings.overwrite,
        }
    }

    /// Simulates every replicate, then writes both output files.
    pub fn run(&self, rng: &mut SimRng) -> Result<RunSummary> {
        self.check_overwrite()?;
        tracing::info!("simulating {} replicates", self.number_of_sims);

        let mut trees = Vec::with_capacity(self.number_of_sims);
        let mut total_rejections = 0;
        for index in 0..self.number_of_sims {
            let (tree, rejections) = self.next_accepted_tree(rng)?;
            total_rejections += rejections;
            tracing::info!(
                "tree {} has {} tips, {} shifts",
                index + 1,
                tree.tip_count(),
                tree.shift_count()
            );
            trees.push(tree);
        }

        self.write_tree_file(&trees)?;
        self.write_event_file(&trees)?;

        let replicates = trees
            .iter()
            .map(|t| ReplicateStats {
                tips: t.tip_count(),
                shifts: t.shift_count(),
            })
            .collect();
        Ok(RunSummary {
            replicates,
            total_rejections,
        })
    }

    /// Builds fresh trees until one satisfies the acceptance windows,
    /// returning it along with the number of rejected attempts.
    pub fn next_accepted_tree(&self, rng: &mut SimRng) -> Result<(SimTree, usize)> {
        let mut rejections = 0;
        loop {
            let tree = SimTree::simulate(&self.growth, rng);
            if self.is_acceptable(&tree) {
                return Ok((tree, rejections));
            }
            rejections += 1;
            tracing::debug!(
                "rejected attempt {}: {} tips, {} shifts, cap exceeded: {}",
                rejections,
                tree.tip_count(),
                tree.shift_count(),
                tree.node_cap_exceeded()
            );
            if rejections > MAX_REJECTIONS {
                tracing::error!("could not simulate a valid tree with these parameters");
                return Err(SimError::RetryLimitExceeded(rejections));
            }
        }
    }

    fn is_acceptable(&self, tree: &SimTree) -> bool {
        if tree.node_cap_exceeded() {
            return false;
        }
        let tips = tree.tip_count();
        let shifts = tree.shift_count();
        tips >= self.mintaxa
            && tips <= self.maxtaxa
            && shifts >= self.min_shifts
            && shifts <= self.max_shifts
    }

    fn check_overwrite(&self) -> Result<()> {
        if self.overwrite {
            return Ok(());
        }
        for path in [&self.tree_path, &self.event_path] {
            if path.exists() {
                tracing::error!("refusing to overwrite {:?}", path);
                return Err(SimError::OutputExists(path.clone()));
            }
        }
        Ok(())
    }

    fn write_tree_file(&self, trees: &[SimTree]) -> Result<()> {
        let mut out = BufWriter::new(File::create(&self.tree_path)?);
        for tree in trees {
            writeln!(out, "{};", tree.newick())?;
        }
        out.flush()?;
        Ok(())
    }

    fn write_event_file(&self, trees: &[SimTree]) -> Result<()> {
        let mut out = BufWriter::new(File::create(&self.event_path)?);
        writeln!(out, "{}", EVENT_FILE_HEADER)?;
        for (index, tree) in trees.iter().enumerate() {
            let mut rows = String::new();
            tree.append_event_rows(index + 1, &mut rows)?;
            out.write_all(rows.as_bytes())?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(treefile: PathBuf, eventfile: PathBuf) -> Settings {
        Settings {
            event_rate: 0.0,
            lambda_init0: 1.0,
            lambda_shift0: 0.0,
            mu_init0: 0.5,
            max_time: 1.5,
            max_number_of_nodes: 2000,
            max_time_for_event: -1.0,
            inc: 0.05,
            rmin: 0.5,
            rmax: 1.0,
            r_init_logscale: false,
            epsmin: 0.1,
            epsmax: 0.9,
            number_of_sims: 3,
            mintaxa: 1,
            maxtaxa: 1_000_000,
            min_number_of_shifts: 0,
            max_number_of_shifts: 1_000_000,
            treefile,
            eventfile,
            seed: -1,
            overwrite: true,
        }
    }

    fn dummy_paths() -> (PathBuf, PathBuf) {
        (PathBuf::from("unused.tre"), PathBuf::from("unused.csv"))
    }

    #[test]
    fn test_wide_open_windows_accept_first_attempt() {
        let (t, e) = dummy_paths();
        let engine = SimEngine::new(&settings(t, e));
        let mut rng = SimRng::seed_from_u64(12);
        let (tree, rejections) = engine.next_accepted_tree(&mut rng).unwrap();
        assert_eq!(rejections, 0);
        assert!(!tree.node_cap_exceeded());
        assert!(tree.tip_count() >= 1);
    }

    #[test]
    fn test_node_cap_of_one_exhausts_retries() {
        let (t, e) = dummy_paths();
        let mut s = settings(t, e);
        s.max_number_of_nodes = 1;
        let engine = SimEngine::new(&s);
        let mut rng = SimRng::seed_from_u64(0);
        let err = engine.next_accepted_tree(&mut rng).unwrap_err();
        match err {
            SimError::RetryLimitExceeded(attempts) => assert_eq!(attempts, MAX_REJECTIONS + 1),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_taxa_window_exhausts_retries() {
        let (t, e) = dummy_paths();
        let mut s = settings(t, e);
        s.mintaxa = 500_000;
        let engine = SimEngine::new(&s);
        let mut rng = SimRng::seed_from_u64(1);
        assert!(matches!(
            engine.next_accepted_tree(&mut rng),
            Err(SimError::RetryLimitExceeded(_))
        ));
    }

    #[test]
    fn test_overwrite_guard_refuses_existing_output() {
        let tree_path = std::env::temp_dir().join(format!(
            "cladesim_engine_overwrite_{}.tre",
            std::process::id()
        ));
        let event_path = std::env::temp_dir().join(format!(
            "cladesim_engine_overwrite_{}.csv",
            std::process::id()
        ));
        std::fs::write(&tree_path, "occupied\n").unwrap();

        let mut s = settings(tree_path.clone(), event_path.clone());
        s.overwrite = false;
        let engine = SimEngine::new(&s);
        let mut rng = SimRng::seed_from_u64(2);
        let err = engine.run(&mut rng).unwrap_err();
        assert!(matches!(err, SimError::OutputExists(p) if p == tree_path));

        let _ = std::fs::remove_file(&tree_path);
        let _ = std::fs::remove_file(&event_path);
    }
}
