//! Driver-owned rendering state: the active program and the texture-unit
//! table.
//!
//! The render loop owns one [`RenderState`] and threads it through
//! program activation and texture binds; nothing here is process-global.

/// Number of texture unit slots.
pub const MAX_TEXTURE_UNITS: usize = 16;

/// Opaque identity of a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) u64);

/// A texture attached to a unit: its view and current sampler.
#[derive(Debug, Clone)]
pub struct BoundTexture {
    /// Full-texture view.
    pub view: wgpu::TextureView,
    /// The sampler at bind time.
    pub sampler: wgpu::Sampler,
}

/// The mutable state a draw depends on between calls: which program is
/// active and what each texture unit holds.
#[derive(Debug, Default)]
pub struct RenderState {
    active_program: Option<ProgramId>,
    units: [Option<BoundTexture>; MAX_TEXTURE_UNITS],
}

impl RenderState {
    /// Empty state: no active program, all units unbound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently activated program, if any.
    #[must_use]
    pub fn active_program(&self) -> Option<ProgramId> {
        self.active_program
    }

    pub(crate) fn set_active_program(&mut self, id: ProgramId) {
        self.active_program = Some(id);
    }

    /// Attach a texture to a unit. An out-of-range unit is ignored with a
    /// warning, mirroring the silent-failure conventions of unit-indexed
    /// graphics APIs.
    pub fn bind_texture(&mut self, unit: usize, texture: BoundTexture) {
        if let Some(slot) = self.units.get_mut(unit) {
            *slot = Some(texture);
        } else {
            log::warn!("texture unit {unit} is out of range (max {MAX_TEXTURE_UNITS}); bind ignored");
        }
    }

    /// The texture currently attached to a unit.
    #[must_use]
    pub fn texture(&self, unit: usize) -> Option<&BoundTexture> {
        self.units.get(unit).and_then(Option::as_ref)
    }

    /// Drop the active program and all unit bindings.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
