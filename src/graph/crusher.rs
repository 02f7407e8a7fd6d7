use std::sync::Arc;

use crate::{
    dsp::{bitcrush::BitCrusher, mix::apply_dry_wet},
    error::StageFault,
    graph::stage::{fixed_inputs, RenderCtx, Stage},
    params::ParamHandle,
};

/// Bit-crusher with its own dry/wet balance.
pub struct BitCrushStage {
    crusher: BitCrusher,
    bit_depth: ParamHandle,
    sample_rate: ParamHandle,
    balance: ParamHandle,
}

impl BitCrushStage {
    pub fn new(bit_depth: ParamHandle, sample_rate: ParamHandle, balance: ParamHandle) -> Self {
        Self {
            crusher: BitCrusher::new(),
            bit_depth,
            sample_rate,
            balance,
        }
    }
}

impl Stage for BitCrushStage {
    fn process(
        &mut self,
        inputs: &[&[f32]],
        out: &mut [f32],
        ctx: &RenderCtx,
    ) -> Result<(), StageFault> {
        let [input] = fixed_inputs::<1>(inputs, out.len())?;

        out.copy_from_slice(input);
        self.crusher.render(
            out,
            self.bit_depth.get(),
            self.sample_rate.get(),
            ctx.sample_rate,
        );
        apply_dry_wet(input, out, self.balance.get());
        Ok(())
    }

    fn reset(&mut self) {
        self.crusher.reset();
    }

    fn params(&self) -> Vec<(&'static str, ParamHandle)> {
        vec![
            ("bit_depth", Arc::clone(&self.bit_depth)),
            ("sample_rate", Arc::clone(&self.sample_rate)),
            ("balance", Arc::clone(&self.balance)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AtomicParam;

    fn stage(bits: f32, balance: f32) -> BitCrushStage {
        BitCrushStage::new(
            Arc::new(AtomicParam::new(bits, 1.0, 24.0)),
            Arc::new(AtomicParam::new(12_000.0, 100.0, 192_000.0)),
            Arc::new(AtomicParam::unit(balance)),
        )
    }

    #[test]
    fn test_zero_balance_is_dry() {
        let ctx = RenderCtx {
            sample_rate: 48_000.0,
            frame: 0,
        };
        let input: Vec<f32> = (0..32).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut out = vec![0.0; 32];

        stage(2.0, 0.0).process(&[&input], &mut out, &ctx).expect("one input");
        assert_eq!(out, input);
    }

    #[test]
    fn test_full_balance_is_crushed() {
        let ctx = RenderCtx {
            sample_rate: 48_000.0,
            frame: 0,
        };
        let input: Vec<f32> = (0..32).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut out = vec![0.0; 32];

        stage(2.0, 1.0).process(&[&input], &mut out, &ctx).expect("one input");
        // 2 bits: every output sits on a quarter step
        assert!(out.iter().all(|s| (s * 4.0).fract() == 0.0));
        assert_ne!(out, input);
    }
}
