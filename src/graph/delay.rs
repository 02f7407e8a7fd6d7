use std::sync::Arc;

use crate::{
    dsp::delay::MultiTapDelay,
    error::StageFault,
    graph::stage::{fixed_inputs, RenderCtx, Stage},
    params::ParamHandle,
};

/// Three-tap echo. Output is wet only; pair it with a dry/wet stage.
pub struct MultiDelayStage {
    delay: MultiTapDelay,
    time: ParamHandle,
    feedback: ParamHandle,
}

impl MultiDelayStage {
    pub fn new(sample_rate: f32, time: ParamHandle, feedback: ParamHandle) -> Self {
        Self {
            delay: MultiTapDelay::new(sample_rate),
            time,
            feedback,
        }
    }
}

impl Stage for MultiDelayStage {
    fn process(
        &mut self,
        inputs: &[&[f32]],
        out: &mut [f32],
        _ctx: &RenderCtx,
    ) -> Result<(), StageFault> {
        let [input] = fixed_inputs::<1>(inputs, out.len())?;

        out.copy_from_slice(input);
        self.delay.render(out, self.time.get(), self.feedback.get());
        Ok(())
    }

    fn reset(&mut self) {
        self.delay.reset();
    }

    fn params(&self) -> Vec<(&'static str, ParamHandle)> {
        vec![
            ("time", Arc::clone(&self.time)),
            ("feedback", Arc::clone(&self.feedback)),
        ]
    }
}
