use std::sync::Arc;

use crate::{
    dsp::mix::crossfade,
    error::StageFault,
    graph::stage::{fixed_inputs, RenderCtx, Stage},
    params::ParamHandle,
};

/*
Dry/Wet Stage
=============

Two inputs, declared in order `[dry, wet]`:

    out = dry × (1 - balance) + wet × balance

In the layered patch both dry/wet stages sit at balance 0, so the effect they
wrap (bit-crusher, multi-delay) runs but is not heard until someone turns the
balance up at runtime. At the endpoints the output is the selected input
exactly, sample for sample.
*/

pub struct DryWetStage {
    balance: ParamHandle,
}

impl DryWetStage {
    pub fn new(balance: ParamHandle) -> Self {
        Self { balance }
    }
}

impl Stage for DryWetStage {
    fn process(
        &mut self,
        inputs: &[&[f32]],
        out: &mut [f32],
        _ctx: &RenderCtx,
    ) -> Result<(), StageFault> {
        let [dry, wet] = fixed_inputs::<2>(inputs, out.len())?;
        crossfade(dry, wet, self.balance.get(), out);
        Ok(())
    }

    fn params(&self) -> Vec<(&'static str, ParamHandle)> {
        vec![("balance", Arc::clone(&self.balance))]
    }
}
