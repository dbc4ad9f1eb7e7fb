use std::collections::HashMap;

/// Memory that survives between independent queries.
///
/// Keys are caller-chosen strings; `cycle` uses the rendered text of its list
/// argument, so two lists that print the same share one counter.
#[derive(Debug, Clone, Default)]
pub struct StateManager {
    cycles: HashMap<String, usize>,
    triggers: HashMap<String, f64>,
}

impl StateManager {
    pub fn new() -> Self {
        StateManager::default()
    }

    pub fn reset(&mut self) {
        self.cycles.clear();
        self.triggers.clear();
    }

    pub fn get_cycle(&self, key: &str) -> usize {
        self.cycles.get(key).copied().unwrap_or(0)
    }

    /// Returns the current index and advances it modulo `len`.
    pub fn increment_cycle(&mut self, key: &str, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let entry = self.cycles.entry(key.to_string()).or_insert(0);
        let current = *entry % len;
        *entry = (current + 1) % len;
        current
    }

    pub fn get_last_trigger(&self, key: &str) -> Option<f64> {
        self.triggers.get(key).copied()
    }

    pub fn set_last_trigger(&mut self, key: &str, time: f64) {
        self.triggers.insert(key.to_string(), time);
    }

    /// True when `key` never fired or fired at least `gap` seconds before `now`.
    pub fn can_trigger(&self, key: &str, now: f64, gap: f64) -> bool {
        match self.get_last_trigger(key) {
            Some(last) => now - last >= gap,
            None => true,
        }
    }

    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_wrap_at_list_length() {
        let mut state = StateManager::new();
        let seen: Vec<usize> = (0..4).map(|_| state.increment_cycle("[a, b, c]", 3)).collect();
        assert_eq!(seen, vec![0, 1, 2, 0]);
        assert_eq!(state.get_cycle("[a, b, c]"), 1);
        assert_eq!(state.increment_cycle("[]", 0), 0);
    }

    #[test]
    fn cooldown_gate() {
        let mut state = StateManager::new();
        assert!(state.can_trigger("snare", 0.0, 10.0));
        state.set_last_trigger("snare", 1.0);
        assert!(!state.can_trigger("snare", 1.5, 1.0));
        assert!(state.can_trigger("snare", 2.5, 1.0));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut state = StateManager::new();
        state.increment_cycle("k", 2);
        state.set_last_trigger("t", 3.0);
        assert_eq!((state.cycle_count(), state.trigger_count()), (1, 1));
        state.reset();
        assert_eq!((state.cycle_count(), state.trigger_count()), (0, 0));
        assert_eq!(state.get_last_trigger("t"), None);
    }
}
