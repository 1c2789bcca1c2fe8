use std::collections::HashSet;

use crate::models::{AvailabilityStats, TimeSlot};

/// Business hours: slots cover [08:00, 18:00) in 15-minute steps.
pub const OPENING_HOUR: u32 = 8;
pub const CLOSING_HOUR: u32 = 18;
pub const SLOT_MINUTES: u32 = 15;
pub const SLOTS_PER_DAY: usize = ((CLOSING_HOUR - OPENING_HOUR) * 60 / SLOT_MINUTES) as usize;

/// The full day's slot template, every slot free. Regenerated on each
/// (dentist, date) change; slot objects carry no identity beyond their
/// time string.
pub fn daily_template() -> Vec<TimeSlot> {
    let mut slots = Vec::with_capacity(SLOTS_PER_DAY);
    for hour in OPENING_HOUR..CLOSING_HOUR {
        for minute in (0..60).step_by(SLOT_MINUTES as usize) {
            slots.push(TimeSlot {
                time: format!("{:02}:{:02}", hour, minute),
                available: true,
                is_occupied: false,
            });
        }
    }
    slots
}

/// Normalize a backend time value to `HH:MM`. Tolerates seconds
/// (`09:00:00`) and un-padded components (`9:0`).
pub fn normalize_time(raw: &str) -> Option<String> {
    let mut parts = raw.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hours, minutes))
}

/// Mark the slots whose time appears in `occupied`.
pub fn apply_occupied(slots: &mut [TimeSlot], occupied: &HashSet<String>) {
    for slot in slots.iter_mut() {
        let is_occupied = occupied.contains(&slot.time);
        slot.is_occupied = is_occupied;
        slot.available = !is_occupied;
    }
}

/// Overlay in-progress holds: a held slot is unavailable but not occupied.
/// Call after `stats_of` so held slots still count as available there.
pub fn apply_held(slots: &mut [TimeSlot], held: &HashSet<String>) {
    for slot in slots.iter_mut() {
        if !slot.is_occupied && held.contains(&slot.time) {
            slot.available = false;
        }
    }
}

pub fn stats_of(slots: &[TimeSlot]) -> AvailabilityStats {
    let occupied = slots.iter().filter(|slot| slot.is_occupied).count();
    AvailabilityStats {
        available: slots.len() - occupied,
        occupied,
        total: slots.len(),
    }
}
