use std::sync::Arc;

use crate::{
    dsp::{mix::apply_dry_wet, reverb::SchroederReverb},
    error::StageFault,
    graph::stage::{fixed_inputs, RenderCtx, Stage},
    params::ParamHandle,
};

/*
Reverb Stage
============

The last stage of the layered patch. `decay_time` is RT60 in seconds: how
long an impulse takes to fall 60 dB. It is read once per block and only
recomputes the comb gains when it actually changed.

    balance 0.0   dry only
    balance 0.5   equal parts room and source
    balance 1.0   room only
*/

pub struct ReverbStage {
    reverb: SchroederReverb,
    decay_time: ParamHandle,
    balance: ParamHandle,
}

impl ReverbStage {
    pub fn new(sample_rate: f32, decay_time: ParamHandle, balance: ParamHandle) -> Self {
        let mut reverb = SchroederReverb::new(sample_rate);
        reverb.set_decay_time(decay_time.get());
        Self {
            reverb,
            decay_time,
            balance,
        }
    }
}

impl Stage for ReverbStage {
    fn process(
        &mut self,
        inputs: &[&[f32]],
        out: &mut [f32],
        _ctx: &RenderCtx,
    ) -> Result<(), StageFault> {
        let [input] = fixed_inputs::<1>(inputs, out.len())?;

        self.reverb.set_decay_time(self.decay_time.get());
        for (o, &x) in out.iter_mut().zip(input.iter()) {
            *o = self.reverb.process(x);
        }
        apply_dry_wet(input, out, self.balance.get());
        Ok(())
    }

    fn reset(&mut self) {
        self.reverb.reset();
    }

    fn params(&self) -> Vec<(&'static str, ParamHandle)> {
        vec![
            ("decay_time", Arc::clone(&self.decay_time)),
            ("balance", Arc::clone(&self.balance)),
        ]
    }
}
