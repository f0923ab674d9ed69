/// Maintenance tracker: Arithmetic Primitives
///
/// Identifier generation and the integer policies the reports rely on.

/// Next identifier for a store whose largest key is `max_existing`.
///
/// Empty stores start at `first_id`. `None` once `i32::MAX` is taken;
/// there is no identifier left that is not already in use.
pub fn next_id(max_existing: Option<i32>, first_id: i32) -> Option<i32> {
    match max_existing {
        Some(max) => max.checked_add(1),
        None => Some(first_id),
    }
}

/// Technician occupancy in percent, truncating before the multiplication.
///
/// 1..=4 orders against a cap of 5 read as 0%; 5 reads as 100%.
pub fn occupancy_percent(execution_orders: usize, cap: i32) -> i32 {
    if cap <= 0 {
        return 0;
    }
    let load = i32::try_from(execution_orders).unwrap_or(i32::MAX);
    (load / cap).saturating_mul(100)
}

/// Capacity a full store asks for next.
pub fn grown_capacity(current: usize, step: usize) -> Option<usize> {
    current.checked_add(step.max(1))
}

/// Apply a signed delta to a running counter without overflow.
pub fn adjust_counter(counter: i32, delta: i32) -> i32 {
    counter.saturating_add(delta)
}
