use std::sync::Arc;

use crate::{
    dsp::mix::accumulate,
    error::StageFault,
    graph::stage::{check_lengths, RenderCtx, Stage},
    params::ParamHandle,
};

/*
Mixer Stage
===========

    in 1 ──┐
    in 2 ──┼──► Σ × gain ──► out
    ...    │
    in N ──┘

Summing only. A mixer is the one stage kind that instruments may feed, so the
layered patch's source mixer is where all six instruments meet. The master
volume of a patch is also just a mixer with a single input and its `gain`
turned down.
*/

pub struct MixerStage {
    gain: ParamHandle,
}

impl MixerStage {
    pub fn new(gain: ParamHandle) -> Self {
        Self { gain }
    }
}

impl Stage for MixerStage {
    fn process(
        &mut self,
        inputs: &[&[f32]],
        out: &mut [f32],
        _ctx: &RenderCtx,
    ) -> Result<(), StageFault> {
        if inputs.is_empty() {
            return Err(StageFault::InputMismatch {
                expected: 1,
                actual: 0,
            });
        }
        check_lengths(inputs, out.len())?;

        let gain = self.gain.get();
        out.fill(0.0);
        for input in inputs {
            accumulate(out, input, gain);
        }
        Ok(())
    }

    fn params(&self) -> Vec<(&'static str, ParamHandle)> {
        vec![("gain", Arc::clone(&self.gain))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AtomicParam;

    const CTX: RenderCtx = RenderCtx {
        sample_rate: 48_000.0,
        frame: 0,
    };

    #[test]
    fn test_sums_inputs_with_gain() {
        let gain = Arc::new(AtomicParam::new(0.5, 0.0, 4.0));
        let mut mixer = MixerStage::new(Arc::clone(&gain));
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 0.0, -1.0];
        let mut out = [9.0; 3];

        mixer.process(&[&a, &b], &mut out, &CTX).expect("valid inputs");
        assert_eq!(out, [1.0, 1.0, 1.0]);

        gain.set(1.0);
        mixer.process(&[&a], &mut out, &CTX).expect("valid inputs");
        assert_eq!(out, a);
    }

    #[test]
    fn test_rejects_missing_inputs() {
        let mut mixer = MixerStage::new(Arc::new(AtomicParam::unit(1.0)));
        let mut out = [0.0; 4];
        assert!(mixer.process(&[], &mut out, &CTX).is_err());
    }
}
