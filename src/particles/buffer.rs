//! Flat render buffers for particle slots.
//!
//! One entry per slot, Structure of Arrays layout, allocated once with the
//! pool. Inactive slots are written as zero position and zero opacity so a
//! renderer can upload the arrays without looking at the active flags.

use super::pool::ParticleSlot;

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleBuffer {
    /// `[x0, y0, z0, x1, y1, z1, ...]`
    positions: Vec<f32>,
    /// `[r0, g0, b0, r1, g1, b1, ...]`
    colors: Vec<f32>,
    sizes: Vec<f32>,
    opacities: Vec<f32>,
}

impl ParticleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: vec![0.0; capacity * 3],
            colors: vec![0.0; capacity * 3],
            sizes: vec![0.0; capacity],
            opacities: vec![0.0; capacity],
        }
    }

    /// Number of slots described.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Copy one slot into the arrays.
    #[inline]
    pub fn write(&mut self, index: usize, slot: &ParticleSlot) {
        if !slot.active {
            self.clear(index);
            return;
        }
        let i = index * 3;
        self.positions[i..i + 3].copy_from_slice(&slot.position);
        self.colors[i..i + 3].copy_from_slice(&slot.color.0);
        self.sizes[index] = slot.size;
        self.opacities[index] = slot.opacity;
    }

    /// Zero one slot.
    #[inline]
    pub fn clear(&mut self, index: usize) {
        let i = index * 3;
        self.positions[i..i + 3].fill(0.0);
        self.colors[i..i + 3].fill(0.0);
        self.sizes[index] = 0.0;
        self.opacities[index] = 0.0;
    }

    /// Zero every slot without reallocating.
    pub fn reset(&mut self) {
        self.positions.fill(0.0);
        self.colors.fill(0.0);
        self.sizes.fill(0.0);
        self.opacities.fill(0.0);
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn opacities(&self) -> &[f32] {
        &self.opacities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::config::Color;

    #[test]
    fn test_write_and_clear() {
        let mut buffer = ParticleBuffer::new(2);
        let slot = ParticleSlot {
            active: true,
            position: [1.0, 2.0, 3.0],
            color: Color([0.5, 0.25, 1.0]),
            size: 0.2,
            opacity: 0.75,
            ..ParticleSlot::dead()
        };

        buffer.write(1, &slot);
        assert_eq!(&buffer.positions()[3..6], &[1.0, 2.0, 3.0]);
        assert_eq!(&buffer.colors()[3..6], &[0.5, 0.25, 1.0]);
        assert_eq!(buffer.sizes()[1], 0.2);
        assert_eq!(buffer.opacities()[1], 0.75);

        buffer.write(1, &ParticleSlot { active: false, ..slot });
        assert_eq!(&buffer.positions()[3..6], &[0.0, 0.0, 0.0]);
        assert_eq!(buffer.opacities()[1], 0.0);
    }
}
