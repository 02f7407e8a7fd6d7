use std::sync::Arc;

use crate::{
    dsp::{filter::SVFilter, lfo::Lfo},
    error::StageFault,
    graph::stage::{fixed_inputs, RenderCtx, Stage},
    params::ParamHandle,
};

/*
Filter Section
==============

A resonant low-pass whose cutoff is swept by a sine LFO:

    cutoff(t) = cutoff + sin(2π · lfo_rate · t) · lfo_depth

The LFO is read once per block (see `dsp/lfo.rs`), and the swept value is
clamped inside the filter to [10 Hz, 0.49 · sample_rate] so a deep sweep never
crosses DC or Nyquist. `lfo_depth = 0` is a static filter.
*/

pub struct FilterStage {
    filter: SVFilter,
    lfo: Lfo,
    cutoff: ParamHandle,
    resonance: ParamHandle,
    lfo_rate: ParamHandle,
    lfo_depth: ParamHandle,
}

impl FilterStage {
    pub fn new(
        cutoff: ParamHandle,
        resonance: ParamHandle,
        lfo_rate: ParamHandle,
        lfo_depth: ParamHandle,
    ) -> Self {
        Self {
            filter: SVFilter::lowpass(),
            lfo: Lfo::new(),
            cutoff,
            resonance,
            lfo_rate,
            lfo_depth,
        }
    }
}

impl Stage for FilterStage {
    fn process(
        &mut self,
        inputs: &[&[f32]],
        out: &mut [f32],
        ctx: &RenderCtx,
    ) -> Result<(), StageFault> {
        let [input] = fixed_inputs::<1>(inputs, out.len())?;

        let sweep = self.lfo.advance(self.lfo_rate.get(), out.len(), ctx.sample_rate);
        let cutoff = self.cutoff.get() + sweep * self.lfo_depth.get();

        out.copy_from_slice(input);
        self.filter.render(out, cutoff, self.resonance.get(), ctx.sample_rate);
        Ok(())
    }

    fn reset(&mut self) {
        self.filter.reset();
        self.lfo.reset();
    }

    fn params(&self) -> Vec<(&'static str, ParamHandle)> {
        vec![
            ("cutoff", Arc::clone(&self.cutoff)),
            ("resonance", Arc::clone(&self.resonance)),
            ("lfo_rate", Arc::clone(&self.lfo_rate)),
            ("lfo_depth", Arc::clone(&self.lfo_depth)),
        ]
    }
}
