use facet::Facet;

/// How a tracking registry holds on to its referent.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Non-owning handle; the registry never keeps the referent alive.
    Weak,

    /// The referent cannot be weakly referenced, so the registry holds an
    /// owning reference instead. The object stays alive until the handle is
    /// removed.
    StrengthenedFallback,
}

/// Liveness report for one tracked handle.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct TrackedStatus {
    pub label: String,
    /// Type name captured at registration; the referent may be gone since.
    pub type_name: String,
    pub created_at_ns: i64,
    /// Whether the referent still exists, computed when the status was read.
    pub alive: bool,
    pub reference_kind: ReferenceKind,
}
