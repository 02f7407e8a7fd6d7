use std::sync::Arc;

use crate::{
    dsp::{delay::DelayLine, mix::apply_dry_wet},
    error::StageFault,
    graph::{
        stage::{fixed_inputs, RenderCtx, Stage},
        topology::ranges,
    },
    params::ParamHandle,
};

/// Doubles the input with a short delayed copy.
pub struct FattenStage {
    line: DelayLine,
    time: ParamHandle,
    balance: ParamHandle,
}

impl FattenStage {
    pub fn new(sample_rate: f32, time: ParamHandle, balance: ParamHandle) -> Self {
        let max_samples = (ranges::FATTEN_TIME.1 * sample_rate).ceil() as usize;
        Self {
            line: DelayLine::new(max_samples),
            time,
            balance,
        }
    }
}

impl Stage for FattenStage {
    fn process(
        &mut self,
        inputs: &[&[f32]],
        out: &mut [f32],
        ctx: &RenderCtx,
    ) -> Result<(), StageFault> {
        let [input] = fixed_inputs::<1>(inputs, out.len())?;

        let delay = (self.time.get() * ctx.sample_rate).round() as usize;
        out.copy_from_slice(input);
        self.line.render(out, delay);
        apply_dry_wet(input, out, self.balance.get());
        Ok(())
    }

    fn reset(&mut self) {
        self.line.reset();
    }

    fn params(&self) -> Vec<(&'static str, ParamHandle)> {
        vec![
            ("time", Arc::clone(&self.time)),
            ("balance", Arc::clone(&self.balance)),
        ]
    }
}
