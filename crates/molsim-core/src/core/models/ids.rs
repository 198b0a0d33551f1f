use slotmap::new_key_type;

// Keys are only meaningful within the molecule whose arenas issued them.
new_key_type! {
    pub struct AtomId;
    pub struct ResidueId;
    pub struct ChainId;
}
