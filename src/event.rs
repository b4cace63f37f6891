use std::collections::{BTreeMap, VecDeque};

use foothold_runtime::ActivationMode;

pub enum Event {
    // Time housekeeping
    Tick,

    // Host lifecycle
    WorldLoaded { scene: String },
    ConfigChanged,

    // Input-derived intents
    ActivationPressed,
    ModeChanged { mode: ActivationMode },
}

impl Event {
    fn label(&self) -> &'static str {
        match self {
            Event::Tick => "Tick",
            Event::WorldLoaded { .. } => "WorldLoaded",
            Event::ConfigChanged => "ConfigChanged",
            Event::ActivationPressed => "ActivationPressed",
            Event::ModeChanged { .. } => "ModeChanged",
        }
    }
}

pub struct EventEnvelope {
    pub id: u64,
    pub tick: u64,
    pub kind: Event,
}

pub struct EventQueue {
    // map of tick -> FIFO queue of events
    by_tick: BTreeMap<u64, VecDeque<EventEnvelope>>,
    pub now: u64,
    next_id: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self {
            by_tick: BTreeMap::new(),
            now: 0,
            next_id: 1,
        }
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn emit_now(&mut self, kind: Event) -> u64 {
        self.emit_at(self.now, kind)
    }

    pub fn emit_at(&mut self, tick: u64, kind: Event) -> u64 {
        let id = self.alloc_id();
        let tick = tick.max(self.now);
        if !matches!(kind, Event::Tick) {
            log::debug!(target: "events", "[tick {}] queue #{} {} for tick {}", self.now, id, kind.label(), tick);
        }
        let env = EventEnvelope { id, tick, kind };
        self.by_tick.entry(tick).or_default().push_back(env);
        id
    }

    pub fn pop_ready(&mut self) -> Option<EventEnvelope> {
        let q = self.by_tick.get_mut(&self.now)?;
        let env = q.pop_front();
        if q.is_empty() {
            self.by_tick.remove(&self.now);
        }
        env
    }

    pub fn advance_tick(&mut self) {
        // anything left in the current bucket rolls into the next tick
        let now = self.now;
        self.now = self.now.wrapping_add(1);
        if let Some(rest) = self.by_tick.remove(&now) {
            if !rest.is_empty() {
                let next = self.by_tick.entry(self.now).or_default();
                for env in rest.into_iter().rev() {
                    next.push_front(env);
                }
            }
        }
    }
}
