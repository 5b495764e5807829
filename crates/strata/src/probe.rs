//! # Probe Scenarios
//!
//! End-to-end checks of arena-backed lists, runnable outside the test
//! harness (see the `strata_probe` binary).
//!
//! Each scenario builds its own arenas, drives a list through one behaviour
//! and records a [`ProbeOutcome`]. Scenarios never panic on a failed check;
//! they report it.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use std::rc::Rc;
use std::thread;
use std::time::Instant;

use strata_alloc::{AllocError, Arena, ArenaAllocator, CountingAllocator};
use strata_list::{Bidirectional, List};

use crate::config::ProbeConfig;

/// Bytes per probe arena: room for two lists of
/// [`MAX_ELEMENTS`](crate::config::MAX_ELEMENTS) `u64` nodes.
pub const PROBE_ARENA_BYTES: usize = 128 * 1024;

/// Deliberately small arena for the exhaustion scenario.
const TINY_ARENA_BYTES: usize = 512;

type ProbeArena = Arena<PROBE_ARENA_BYTES>;
type Nodes<'a, T> = ArenaAllocator<'a, T, PROBE_ARENA_BYTES>;

/// Result of one probe scenario.
#[derive(Clone, Debug)]
pub struct ProbeOutcome {
    /// Scenario name.
    pub name: &'static str,
    /// Whether every check held.
    pub passed: bool,
    /// Wall time in microseconds.
    pub elapsed_us: u64,
    /// What was observed.
    pub details: String,
}

/// Runs the probe scenarios and collects their outcomes.
pub struct ProbeRunner {
    config: ProbeConfig,
    results: Vec<ProbeOutcome>,
}

impl ProbeRunner {
    /// Creates a runner for `config`.
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    /// Runs every scenario in order.
    pub fn run_all(&mut self) {
        self.run("push/pop sequence", scenario_push_pop);
        self.run("arena containment", scenario_arena_containment);
        self.run("arena exhaustion", scenario_exhaustion);
        self.run("clone panic rollback", scenario_clone_rollback);
        self.run("assignment panic rollback", scenario_assign_rollback);
        self.run("allocator propagation", scenario_propagation);
        self.run("erase/insert round trip", scenario_erase_insert);
    }

    fn run(&mut self, name: &'static str, scenario: fn(&ProbeConfig) -> Result<String, String>) {
        let start = Instant::now();
        let outcome = scenario(&self.config);
        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        let (passed, details) = match outcome {
            Ok(details) => (true, details),
            Err(details) => {
                tracing::warn!(scenario = name, %details, "probe scenario failed");
                (false, details)
            }
        };
        tracing::info!(scenario = name, passed, elapsed_us, "probe scenario finished");

        self.results.push(ProbeOutcome {
            name,
            passed,
            elapsed_us,
            details,
        });
    }

    /// Outcomes recorded so far.
    #[must_use]
    pub fn results(&self) -> &[ProbeOutcome] {
        &self.results
    }

    /// Whether every recorded scenario passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Prints a summary table to stdout.
    pub fn print_results(&self) {
        println!();
        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                     STRATA PROBE SCENARIOS                       ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();

        for result in &self.results {
            let status = if result.passed { "✓ PASS" } else { "✗ FAIL" };
            println!("┌─ {} ", result.name);
            println!("│ Status:  {status}");
            println!("│ Time:    {}μs", result.elapsed_us);
            println!("│ Details: {}", result.details);
            println!("└──────────────────────────────────────────────────────────────────");
            println!();
        }

        println!("╔══════════════════════════════════════════════════════════════════╗");
        if self.all_passed() {
            println!("║  ✓ ALL {} SCENARIOS PASSED                                       ║", self.results.len());
        } else {
            let failed = self.results.iter().filter(|r| !r.passed).count();
            println!("║  ✗ {failed} SCENARIO(S) FAILED                                          ║");
        }
        println!("╚══════════════════════════════════════════════════════════════════╝");
    }
}

/// Turns a failed check into the scenario's error text.
fn check(condition: bool, what: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(what())
    }
}

fn in_arena<T, const N: usize>(arena: &Arena<N>, value: &T) -> bool {
    arena.contains(NonNull::from(value).cast())
}

/// Runs `f`, turning a panic into an `Err`.
///
/// The process panic hook still sees the panic; the binary decides how it
/// is reported.
fn contained<R>(f: impl FnOnce() -> R) -> thread::Result<R> {
    panic::catch_unwind(AssertUnwindSafe(f))
}

// ============================================================================
// INSTRUMENTED ELEMENT
// ============================================================================

/// Counters shared by every [`Tracked`] value in a scenario.
#[derive(Default)]
struct Ledger {
    clones: Cell<usize>,
    fail_at: Cell<Option<usize>>,
    live: Cell<usize>,
}

impl Ledger {
    fn arm(&self, nth: usize) {
        self.clones.set(0);
        self.fail_at.set(Some(nth));
    }
}

/// Element that refuses its `fail_at`-th clone by panicking.
struct Tracked {
    value: usize,
    ledger: Rc<Ledger>,
}

impl Tracked {
    fn new(value: usize, ledger: &Rc<Ledger>) -> Self {
        ledger.live.set(ledger.live.get() + 1);
        Self {
            value,
            ledger: Rc::clone(ledger),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        let ledger = &self.ledger;
        let nth = ledger.clones.get();
        assert!(ledger.fail_at.get() != Some(nth), "clone #{nth} refused");
        ledger.clones.set(nth + 1);
        Self::new(self.value, ledger)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger.live.set(self.ledger.live.get() - 1);
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

fn scenario_push_pop(_config: &ProbeConfig) -> Result<String, String> {
    let arena = ProbeArena::new();
    let mut list = List::new_in(Nodes::<u32>::new(&arena));

    list.push_back(1).map_err(|e| e.to_string())?;
    list.push_back(2).map_err(|e| e.to_string())?;
    list.push_front(0).map_err(|e| e.to_string())?;
    let after_push: Vec<u32> = list.iter().copied().collect();
    check(after_push == [0, 1, 2] && list.len() == 3, || {
        format!("after pushes: {after_push:?}, len {}", list.len())
    })?;

    let popped = list.pop_back();
    let after_pop: Vec<u32> = list.iter().copied().collect();
    check(popped == Some(2) && after_pop == [0, 1], || {
        format!("pop_back gave {popped:?}, left {after_pop:?}")
    })?;

    Ok("[0, 1, 2] then pop_back -> [0, 1]".to_string())
}

fn scenario_arena_containment(config: &ProbeConfig) -> Result<String, String> {
    let arena = ProbeArena::new();
    let counted = CountingAllocator::new(Nodes::<u64>::new(&arena));
    let mut list = List::new_in(counted.clone());

    for value in 0..config.elements as u64 {
        list.push_back(value).map_err(|e| e.to_string())?;
    }

    let outside = list.iter().filter(|v| !in_arena(&arena, *v)).count();
    check(outside == 0, || format!("{outside} elements outside the arena"))?;
    check(counted.stats().live_blocks() == config.elements, || {
        format!("{} live blocks", counted.stats().live_blocks())
    })?;

    Ok(format!(
        "{} nodes, {} of {} arena bytes used",
        list.len(),
        arena.used(),
        arena.capacity()
    ))
}

fn scenario_exhaustion(_config: &ProbeConfig) -> Result<String, String> {
    let arena: Arena<TINY_ARENA_BYTES> = Arena::new();
    let mut list = List::new_in(ArenaAllocator::<'_, u64, TINY_ARENA_BYTES>::new(&arena));

    let mut pushed = 0u64;
    let err = loop {
        match list.push_back(pushed) {
            Ok(()) => pushed += 1,
            Err(err) => break err,
        }
    };

    check(matches!(err, AllocError::CapacityExceeded { .. }), || {
        format!("unexpected error: {err}")
    })?;
    check(list.iter().copied().eq(0..pushed), || {
        "list changed by the failed push".to_string()
    })?;

    Ok(format!("{pushed} nodes fit, then: {err}"))
}

fn scenario_clone_rollback(config: &ProbeConfig) -> Result<String, String> {
    let arena = ProbeArena::new();
    let ledger = Rc::new(Ledger::default());
    let seed = Tracked::new(7, &ledger);
    let counted = CountingAllocator::new(Nodes::<Tracked>::new(&arena));
    ledger.arm(config.fail_at_clone);

    let outcome = contained(|| List::from_elem_in(config.elements, &seed, counted.clone()));

    check(outcome.is_err(), || "the clone panic was swallowed".to_string())?;
    check(counted.stats().live_blocks() == 0, || {
        format!("{} nodes leaked", counted.stats().live_blocks())
    })?;
    check(ledger.live.get() == 1, || {
        format!("{} elements alive, expected only the seed", ledger.live.get())
    })?;

    Ok(format!(
        "panic at clone #{}, {} nodes released",
        config.fail_at_clone,
        counted.stats().deallocations()
    ))
}

fn scenario_assign_rollback(config: &ProbeConfig) -> Result<String, String> {
    let home = ProbeArena::new();
    let away = ProbeArena::new();
    let ledger = Rc::new(Ledger::default());
    let target_alloc = CountingAllocator::new(Nodes::<Tracked>::new(&home)).propagating();
    let source_alloc = CountingAllocator::new(Nodes::<Tracked>::new(&away));

    let kept = config.elements / 2 + 1;
    let mut target = List::new_in(target_alloc.clone());
    let mut source = List::new_in(source_alloc.clone());
    for i in 0..kept {
        target.push_back(Tracked::new(i, &ledger)).map_err(|e| e.to_string())?;
    }
    for i in 0..config.elements {
        source.push_back(Tracked::new(1000 + i, &ledger)).map_err(|e| e.to_string())?;
    }
    ledger.arm(config.fail_at_clone);

    let outcome = contained(|| target.clone_from(&source));

    check(outcome.is_err(), || "the clone panic was swallowed".to_string())?;
    check(target.iter().map(|t| t.value).eq(0..kept), || {
        "target contents changed".to_string()
    })?;
    check(*target.allocator() == target_alloc, || {
        "target kept the source allocator".to_string()
    })?;
    check(source_alloc.stats().live_blocks() == config.elements, || {
        format!("{} source-arena blocks live", source_alloc.stats().live_blocks())
    })?;

    Ok(format!(
        "{kept} elements and allocator restored after panic at clone #{}",
        config.fail_at_clone
    ))
}

fn scenario_propagation(config: &ProbeConfig) -> Result<String, String> {
    let home = ProbeArena::new();
    let away = ProbeArena::new();
    let mut target = List::new_in(Nodes::<u64>::new(&home).propagating());
    let mut source = List::new_in(Nodes::<u64>::new(&away));
    for value in 0..config.elements as u64 {
        target.push_back(value).map_err(|e| e.to_string())?;
        source.push_back(value * 3).map_err(|e| e.to_string())?;
    }

    target.try_clone_from(&source).map_err(|e| e.to_string())?;

    check(target == source, || "contents differ after assignment".to_string())?;
    check(target.allocator() == source.allocator(), || {
        "allocator was not propagated".to_string()
    })?;
    check(target.iter().all(|v| in_arena(&away, v)), || {
        "copies were not placed in the source arena".to_string()
    })?;

    Ok(format!(
        "{} elements now in the source arena ({} bytes used there)",
        target.len(),
        away.used()
    ))
}

fn scenario_erase_insert(config: &ProbeConfig) -> Result<String, String> {
    let arena = ProbeArena::new();
    let len = config.elements.min(32);
    let mut list = List::new_in(Nodes::<usize>::new(&arena));
    for value in 0..len {
        list.push_back(value).map_err(|e| e.to_string())?;
    }

    for position in 0..len {
        let mut cursor = list.cursor_front_mut();
        for _ in 0..position {
            cursor.move_next();
        }
        let value = cursor
            .remove_current()
            .ok_or_else(|| format!("nothing to erase at {position}"))?;
        cursor.insert_before(value).map_err(|e| e.to_string())?;
        check(list.iter().copied().eq(0..len), || {
            format!("content changed at position {position}")
        })?;
    }

    Ok(format!("{len} positions erased and re-inserted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_every_scenario() {
        let mut runner = ProbeRunner::new(ProbeConfig::default());
        runner.run_all();
        for outcome in runner.results() {
            assert!(outcome.passed, "{}: {}", outcome.name, outcome.details);
        }
        assert_eq!(runner.results().len(), 7);
        assert!(runner.all_passed());
    }

    #[test]
    fn test_small_config_passes() {
        let config = ProbeConfig {
            elements: 1,
            fail_at_clone: 0,
            ..ProbeConfig::default()
        };
        let mut runner = ProbeRunner::new(config);
        runner.run_all();
        assert!(runner.all_passed(), "{:?}", runner.results());
    }

    #[test]
    fn test_check_reports_message() {
        assert_eq!(check(false, || "boom".to_string()), Err("boom".to_string()));
        assert_eq!(check(true, || unreachable!()), Ok(()));
    }
}
