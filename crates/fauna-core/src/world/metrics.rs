//! `TickTelemetry`: the non-fatal fault counters every tick surfaces
//! instead of panicking.

/// Per-tick fault and throughput counters, reset at the start of `World::step`
/// and left readable afterward via `World::telemetry`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickTelemetry {
    pub step_index: u64,
    /// Mass accepted into new resource-field particles this tick.
    pub particle_input_this_tick: f32,
    /// Detritus mass converted to heat (lost) this tick.
    pub detritus_heat_this_tick: f32,
    /// Resource-field particle spawns dropped for lack of a free slot.
    pub dropped_spawn_count: u32,
    /// `Brain::think` calls that returned `BrainError` this tick.
    pub brain_failures_this_tick: u32,
    /// Organisms whose position or velocity was non-finite before physics
    /// clamped it this tick.
    pub nan_corrections_this_tick: u32,
    /// Spatial queries that hit `SpatialGrid::MAX_QUERY_RESULTS` this tick.
    pub query_overflow_count: u32,
    pub live_organism_count: u32,
    pub flora_count: u32,
}

impl TickTelemetry {
    fn reset(&mut self) {
        let step_index = self.step_index;
        *self = TickTelemetry {
            step_index,
            ..TickTelemetry::default()
        };
    }

    pub(super) fn begin_tick(&mut self) {
        self.reset();
    }
}
