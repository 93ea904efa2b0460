/// Pipeline segment registry.
///
/// Defines the canonical list of monitored pipeline segments (assets),
/// along with their metadata and configured MAOP limits. This is the
/// single source of truth for segment ids — other modules should
/// reference segments from here rather than hardcoding ids.
///
/// MAOP values come from the engineering asset records and are treated as
/// fixed configuration; a reading's `maop_psig` field captures the value
/// in force at insertion time so historical readings stay evaluable after
/// a reconfiguration.

// ---------------------------------------------------------------------------
// Segment metadata
// ---------------------------------------------------------------------------

/// Metadata for a single monitored pipeline segment.
pub struct Segment {
    /// Segment id in `SEG-NN` form.
    pub segment_id: &'static str,
    /// Engineering asset name.
    pub name: &'static str,
    /// Human-readable description of the segment's role in the network.
    pub description: &'static str,
    /// Maximum Allowable Operating Pressure, in PSIG. Always > 0.
    pub maop_psig: f64,
    /// Primary pressure transmitter assigned to this segment.
    pub primary_sensor_id: i32,
}

/// All monitored segments, ordered by segment id.
///
/// Sources:
///   - Asset metadata: engineering records (pipe grade, class location)
///   - MAOP values: the operator's MAOP determination filings
pub static SEGMENT_REGISTRY: &[Segment] = &[
    Segment {
        segment_id: "SEG-01",
        name: "Mainline South",
        description: "24-inch X52 mainline south of the compressor station. \
                      Primary throughput segment; pressure here leads the \
                      rest of the network.",
        maop_psig: 1000.0,
        primary_sensor_id: 1,
    },
    Segment {
        segment_id: "SEG-02",
        name: "Mainline North",
        description: "24-inch X60 mainline in a Class 2 location. Tightest \
                      operating margin in the network — most compliance \
                      events originate here.",
        maop_psig: 950.0,
        primary_sensor_id: 2,
    },
    Segment {
        segment_id: "SEG-03",
        name: "Eastern Branch",
        description: "16-inch seamless branch feeding the eastern delivery \
                      points. Lower MAOP due to reduced wall thickness.",
        maop_psig: 875.0,
        primary_sensor_id: 3,
    },
    Segment {
        segment_id: "SEG-04",
        name: "Western Spur",
        description: "20-inch X65 spur serving the western laterals. \
                      Intermittent flow; prone to short pump transients \
                      that the spike filter should suppress.",
        maop_psig: 1100.0,
        primary_sensor_id: 4,
    },
];

/// Returns the ids of all monitored segments.
pub fn all_segment_ids() -> Vec<&'static str> {
    SEGMENT_REGISTRY.iter().map(|s| s.segment_id).collect()
}

/// Looks up a segment by id. Returns `None` if not found.
pub fn find_segment(segment_id: &str) -> Option<&'static Segment> {
    SEGMENT_REGISTRY.iter().find(|s| s.segment_id == segment_id)
}

/// Configured MAOP for a segment, if the segment is registered.
pub fn maop_for(segment_id: &str) -> Option<f64> {
    find_segment(segment_id).map(|s| s.maop_psig)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
