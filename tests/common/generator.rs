//! Random call logs for property checks
//!
//! Builds a random menu tree, then walks it once per call. Walks mostly
//! follow tree edges but occasionally jump anywhere, stall on the same node,
//! or emit junk rows, so the logs exercise dedup, anomalies and row skips.

use super::fixtures::HEADER;
use callpath::SourceFile;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct LogGenerator {
    pub nodes: u64,
    pub calls: usize,
    pub max_walk: usize,
    /// Chance per step of jumping to a random node
    pub jump_rate: f64,
}

impl Default for LogGenerator {
    fn default() -> Self {
        Self {
            nodes: 40,
            calls: 150,
            max_walk: 8,
            jump_rate: 0.1,
        }
    }
}

const DAYS: &[&str] = &[
    "2024-03-04", "2024-03-05", "2024-03-06", "2024-03-07", "2024-03-08", "2024-03-09",
    "2024-03-10", "03/11/2024", "garbage", "",
];

impl LogGenerator {
    /// Node ids are 1..=nodes; node 1 is the root, every other node's parent
    /// has a smaller id
    pub fn parents(&self, rng: &mut StdRng) -> Vec<(u64, u64)> {
        (1..=self.nodes)
            .map(|id| {
                let parent = if id == 1 { 0 } else { rng.gen_range(1..id) };
                (id, parent)
            })
            .collect()
    }

    pub fn generate(&self, name: &str, seed: u64) -> SourceFile {
        let mut rng = StdRng::seed_from_u64(seed);
        let parents = self.parents(&mut rng);
        let children = |p: u64| -> Vec<u64> {
            parents
                .iter()
                .filter(|(_, parent)| *parent == p)
                .map(|(id, _)| *id)
                .collect()
        };
        let parent_of = |id: u64| parents[(id - 1) as usize].1;
        // Some labels repeat on purpose
        let text_of = |id: u64| format!("Option {}", id % 17);

        let mut lines = vec![HEADER.to_string()];
        for call in 0..self.calls {
            let date = DAYS[rng.gen_range(0..DAYS.len())];
            let mut current = 1u64;
            let steps = rng.gen_range(1..=self.max_walk);
            for _ in 0..steps {
                lines.push(format!(
                    "c{},{},{},{},{},",
                    call,
                    date,
                    current,
                    parent_of(current),
                    text_of(current)
                ));
                if rng.gen_bool(0.05) {
                    lines.push(format!("c{},{},oops,1,Broken,", call, date));
                }
                let roll: f64 = rng.gen();
                if roll < self.jump_rate {
                    current = rng.gen_range(1..=self.nodes);
                } else if roll < self.jump_rate + 0.1 {
                    // stall: the same node is logged again
                } else {
                    let next = children(current);
                    if next.is_empty() {
                        break;
                    }
                    current = next[rng.gen_range(0..next.len())];
                }
            }
        }
        SourceFile::new(name, lines.join("\n"))
    }
}
