use crate::active::ActiveSet;
use crate::grid::{Cell, GridStore};
use crate::settings::{Boundary, Settings, SpawnRule};

/// Neighbor offsets in redistribution order: up, left, down, right
const NEIGHBORS: [(i64, i64); 4] = [(0, -1), (-1, 0), (0, 1), (1, 0)];

/// What a single step did to the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Cells that toppled
    pub toppled: usize,
    /// Grains added to neighbors that already held a cell
    pub delivered: u64,
    /// Grains placed in newly created cells
    pub seeded: u64,
    /// Neighbor directions dropped by the boundary
    pub spilled: usize,
}

/// Abelian sandpile state: a slot grid and the ordered set of its occupied slots
pub struct Sandpile {
    pub grid_width: usize,
    pub grid_height: usize,
    grid: GridStore,
    active: ActiveSet,
    threshold: u64,
    boundary: Boundary,
    spawn_rule: SpawnRule,
    last_step: StepStats,
}

impl Sandpile {
    /// Build an empty grid and place the seed at the center
    pub fn new(width: usize, height: usize, settings: &Settings) -> Self {
        let mut pile = Self::empty(width, height, settings);
        pile.reset(settings.initial_grains);
        pile
    }

    /// Build a grid with no cells
    pub fn empty(width: usize, height: usize, settings: &Settings) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            grid: GridStore::new(width, height),
            active: ActiveSet::new(),
            threshold: settings.threshold,
            boundary: settings.boundary,
            spawn_rule: settings.spawn_rule,
            last_step: StepStats::default(),
        }
    }

    /// Clear everything and place a single seed at the center
    pub fn reset(&mut self, initial_grains: u64) {
        self.grid.reset();
        self.active.clear();
        self.last_step = StepStats::default();
        let (cx, cy) = self.center();
        self.add_grains(cx, cy, initial_grains);
    }

    pub fn center(&self) -> (usize, usize) {
        (self.grid_width / 2, self.grid_height / 2)
    }

    /// Add grains at (x, y), creating the cell if needed.
    /// Returns false when nothing was placed (zero grains or no slot).
    pub fn add_grains(&mut self, x: usize, y: usize, grains: u64) -> bool {
        if grains == 0 {
            return false;
        }
        if let Some(cell) = self.grid.get_mut(x as i64, y as i64) {
            cell.grains += grains;
            return true;
        }
        if self.grid.insert(Cell::new(x, y, grains)) {
            self.active.push(x, y);
            true
        } else {
            false
        }
    }

    /// Topple every active cell at or above the threshold once.
    /// Returns the number of cells that toppled; 0 means the pile is stable.
    pub fn step(&mut self) -> usize {
        self.step_detailed().toppled
    }

    pub fn step_detailed(&mut self) -> StepStats {
        let working = self.active.take();
        let threshold = self.threshold;
        let share = threshold / 4;
        let seed = self.spawn_rule.seed_amount(threshold);
        let mut stats = StepStats::default();

        for (x, y) in working {
            let (cx, cy) = (x as i64, y as i64);
            let Some(cell) = self.grid.get_mut(cx, cy) else {
                continue;
            };

            if cell.grains >= threshold {
                cell.grains -= threshold;
                stats.toppled += 1;

                for (dx, dy) in NEIGHBORS {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if !self.boundary.admits(nx, ny, self.grid_width, self.grid_height) {
                        stats.spilled += 1;
                        continue;
                    }
                    if let Some(neighbor) = self.grid.get_mut(nx, ny) {
                        neighbor.grains += share;
                        stats.delivered += share;
                    } else if seed > 0 && self.grid.insert(Cell::new(nx as usize, ny as usize, seed)) {
                        self.active.push(nx as usize, ny as usize);
                        stats.seeded += seed;
                    }
                }
            }

            let remaining = self.grid.get(cx, cy).map_or(0, |c| c.grains);
            if remaining > 0 {
                self.active.push(x, y);
            } else {
                self.grid.clear(cx, cy);
            }
        }

        log::trace!(
            "step: toppled={} delivered={} seeded={} spilled={}",
            stats.toppled,
            stats.delivered,
            stats.seeded,
            stats.spilled
        );
        self.last_step = stats;
        stats
    }

    pub fn last_step(&self) -> StepStats {
        self.last_step
    }

    /// No active cell is at or above the threshold
    #[cfg(test)]
    pub fn is_stable(&self) -> bool {
        self.cells().all(|c| c.grains < self.threshold)
    }

    /// Cells in active-set order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.active
            .iter()
            .filter_map(|(x, y)| self.grid.get(x as i64, y as i64))
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        self.grid.get(x as i64, y as i64)
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn total_grains(&self) -> u64 {
        self.cells().map(|c| c.grains).sum()
    }

    /// Grid slots and active set describe the same cells, each once, all non-empty
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        for (x, y) in self.active.iter() {
            if !seen.insert((x, y)) {
                return false;
            }
            match self.grid.get(x as i64, y as i64) {
                Some(cell) if cell.grains > 0 && cell.x == x && cell.y == y => {}
                _ => return false,
            }
        }
        self.grid.occupied() == seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MAX_THRESHOLD, MIN_THRESHOLD};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn settings(threshold: u64, initial_grains: u64) -> Settings {
        Settings {
            threshold,
            initial_grains,
            ..Default::default()
        }
    }

    fn run_to_stable(pile: &mut Sandpile, limit: usize) -> usize {
        for steps in 0..limit {
            if pile.step() == 0 {
                return steps;
            }
            assert!(pile.is_consistent(), "grid and active set diverged");
        }
        panic!("pile did not stabilise within {} steps", limit);
    }

    #[test]
    fn test_seed_placed_at_center() {
        let pile = Sandpile::new(9, 7, &settings(4, 100));
        assert_eq!(pile.active_len(), 1);
        assert_eq!(pile.get(4, 3), Some(&Cell::new(4, 3, 100)));
        assert!(pile.is_consistent());
    }

    #[test]
    fn test_first_step_of_eight_grain_seed() {
        let mut pile = Sandpile::new(9, 9, &settings(4, 8));
        assert_eq!(pile.step(), 1);

        // Seed keeps 4 grains and waits for the next step
        assert_eq!(pile.get(4, 4).unwrap().grains, 4);
        for (x, y) in [(4, 3), (3, 4), (4, 5), (5, 4)] {
            assert_eq!(pile.get(x, y).unwrap().grains, 1);
        }

        // New neighbors are queued before the surviving seed
        let order: Vec<_> = pile.cells().map(|c| (c.x, c.y)).collect();
        assert_eq!(order, vec![(4, 3), (3, 4), (4, 5), (5, 4), (4, 4)]);
        assert!(pile.is_consistent());
    }

    #[test]
    fn test_sub_threshold_cell_is_left_alone() {
        let mut pile = Sandpile::new(9, 9, &settings(4, 3));
        assert_eq!(pile.step(), 0);
        assert_eq!(pile.get(4, 4), Some(&Cell::new(4, 4, 3)));
        assert_eq!(pile.active_len(), 1);
    }

    #[test]
    fn test_cell_emptied_by_topple_is_cleared() {
        let mut pile = Sandpile::new(9, 9, &settings(4, 4));
        assert_eq!(pile.step(), 1);
        assert!(pile.get(4, 4).is_none());
        assert_eq!(pile.active_len(), 4);
        assert!(pile.is_consistent());
    }

    #[test]
    fn test_existing_neighbor_grows_by_quarter_threshold() {
        // A new neighbor gets 1 grain, an existing one gets threshold/4
        let mut pile = Sandpile::empty(9, 9, &settings(8, 1));
        pile.add_grains(4, 4, 8);
        pile.add_grains(5, 4, 1);

        assert_eq!(pile.step(), 1);
        assert_eq!(pile.get(5, 4).unwrap().grains, 3);
        assert_eq!(pile.get(4, 3).unwrap().grains, 1);
        assert_eq!(pile.get(3, 4).unwrap().grains, 1);
        assert_eq!(pile.get(4, 5).unwrap().grains, 1);
    }

    #[test]
    fn test_share_rule_seeds_quarter_threshold() {
        let s = Settings {
            spawn_rule: SpawnRule::Share,
            ..settings(8, 8)
        };
        let mut pile = Sandpile::new(9, 9, &s);
        pile.step();
        assert_eq!(pile.get(4, 3).unwrap().grains, 2);
        assert!(pile.get(4, 4).is_none());
    }

    #[test]
    fn test_share_rule_with_small_threshold_creates_nothing() {
        let s = Settings {
            spawn_rule: SpawnRule::Share,
            ..settings(2, 2)
        };
        let mut pile = Sandpile::new(9, 9, &s);
        let stats = pile.step_detailed();
        assert_eq!(stats.toppled, 1);
        assert_eq!(stats.seeded, 0);
        assert_eq!(pile.active_len(), 0);
        assert!(pile.is_consistent());
    }

    #[test]
    fn test_stability_is_idempotent() {
        let mut pile = Sandpile::new(40, 40, &settings(4, 100));
        run_to_stable(&mut pile, 10_000);
        assert!(pile.is_stable());
        let snapshot: Vec<Cell> = pile.cells().copied().collect();
        assert_eq!(pile.step(), 0);
        assert_eq!(pile.step(), 0);
        let after: Vec<Cell> = pile.cells().copied().collect();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn test_conservation_with_leakage() {
        let mut pile = Sandpile::new(6, 6, &settings(4, 300));
        for _ in 0..500 {
            let before = pile.total_grains();
            let stats = pile.step_detailed();
            let after = pile.total_grains();
            assert_eq!(
                after + stats.toppled as u64 * 4,
                before + stats.delivered + stats.seeded
            );
            if stats.toppled == 0 {
                break;
            }
        }
    }

    #[test]
    fn test_share_rule_only_loses_grains_at_boundary() {
        let s = Settings {
            spawn_rule: SpawnRule::Share,
            boundary: Boundary::Strict,
            ..settings(4, 200)
        };
        let mut pile = Sandpile::new(5, 5, &s);
        let mut spilled = 0u64;
        loop {
            let stats = pile.step_detailed();
            spilled += stats.spilled as u64;
            if stats.toppled == 0 {
                break;
            }
        }
        assert!(spilled > 0);
        assert_eq!(pile.total_grains() + spilled, 200);
    }

    #[test]
    fn test_inclusive_boundary_fills_guard_column() {
        let mut pile = Sandpile::empty(4, 4, &settings(4, 1));
        pile.add_grains(3, 1, 4);
        let stats = pile.step_detailed();
        assert_eq!(stats.spilled, 0);
        assert_eq!(pile.get(4, 1).map(|c| c.grains), Some(1));
        assert!(pile.is_consistent());
    }

    #[test]
    fn test_inclusive_boundary_fills_guard_row() {
        let mut pile = Sandpile::empty(4, 4, &settings(4, 1));
        pile.add_grains(1, 3, 4);
        let stats = pile.step_detailed();
        assert_eq!(stats.spilled, 0);
        assert_eq!(pile.get(1, 4).map(|c| c.grains), Some(1));
        assert!(pile.is_consistent());
    }

    #[test]
    fn test_strict_boundary_drops_guard_column() {
        let s = Settings {
            boundary: Boundary::Strict,
            ..settings(4, 1)
        };
        let mut pile = Sandpile::empty(4, 4, &s);
        pile.add_grains(3, 1, 4);
        let stats = pile.step_detailed();
        assert_eq!(stats.spilled, 1);
        assert!(pile.get(4, 1).is_none());
    }

    #[test]
    fn test_corner_cell_spills_negative_neighbors() {
        let mut pile = Sandpile::empty(4, 4, &settings(4, 1));
        pile.add_grains(0, 0, 4);
        let stats = pile.step_detailed();
        assert_eq!(stats.spilled, 2);
        assert_eq!(pile.active_len(), 2);
    }

    #[test]
    fn test_random_piles_stay_consistent() {
        let mut rng = StdRng::seed_from_u64(0x5a4d);
        for _ in 0..20 {
            let threshold = rng.gen_range(MIN_THRESHOLD..=12);
            let s = Settings {
                spawn_rule: if rng.gen_bool(0.5) { SpawnRule::Single } else { SpawnRule::Share },
                boundary: if rng.gen_bool(0.5) { Boundary::Inclusive } else { Boundary::Strict },
                ..settings(threshold, 1)
            };
            let (w, h) = (rng.gen_range(1..12), rng.gen_range(1..12));
            let mut pile = Sandpile::empty(w, h, &s);
            for _ in 0..rng.gen_range(1..20) {
                pile.add_grains(rng.gen_range(0..w), rng.gen_range(0..h), rng.gen_range(1..40));
            }
            assert!(pile.is_consistent());

            for _ in 0..2000 {
                let before = pile.total_grains();
                let stats = pile.step_detailed();
                assert!(pile.is_consistent());
                assert_eq!(
                    pile.total_grains() + stats.toppled as u64 * threshold,
                    before + stats.delivered + stats.seeded
                );
                if stats.toppled == 0 {
                    assert_eq!(pile.step(), 0);
                    break;
                }
            }
        }
    }

    #[test]
    fn test_every_accepted_threshold_settles() {
        for spawn_rule in [SpawnRule::Single, SpawnRule::Share] {
            for threshold in MIN_THRESHOLD..=MAX_THRESHOLD {
                let s = Settings {
                    spawn_rule,
                    ..settings(threshold, threshold * 3 + 1)
                };
                assert!(s.validate().is_ok());
                let mut pile = Sandpile::new(10, 10, &s);
                let settled = (0..10_000).any(|_| pile.step() == 0);
                assert!(settled, "threshold {} ({}) never settled", threshold, spawn_rule.name());
                assert!(pile.is_stable());
            }
        }
    }

    #[test]
    fn test_add_grains_rejects_zero() {
        let mut pile = Sandpile::empty(4, 4, &settings(4, 1));
        assert!(!pile.add_grains(1, 1, 0));
        assert_eq!(pile.active_len(), 0);
    }
}
