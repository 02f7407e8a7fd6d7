use crate::{
    error::StageFault,
    graph::{
        crusher::BitCrushStage, delay::MultiDelayStage, dry_wet::DryWetStage,
        fatten::FattenStage, filter::FilterStage, mixer::MixerStage, reverb::ReverbStage,
        topology::StageKind,
    },
    params::ParamHandle,
};

/// Context passed to stages for one block.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    /// Absolute frame index of the first sample in the block.
    pub frame: u64,
}

/// One node of the signal graph.
///
/// `inputs` holds one block per declared input, in declaration order, each the
/// same length as `out`. A stage must fully overwrite `out`. Returning `Err`
/// (or writing non-finite samples) makes the graph substitute silence for
/// this block.
pub trait Stage: Send {
    fn process(
        &mut self,
        inputs: &[&[f32]],
        out: &mut [f32],
        ctx: &RenderCtx,
    ) -> Result<(), StageFault>;

    /// Clear internal state (delay lines, filter memory).
    fn reset(&mut self) {}

    /// Runtime-settable parameters, by name.
    fn params(&self) -> Vec<(&'static str, ParamHandle)> {
        Vec::new()
    }
}

/// Destructure exactly `N` equal-length input blocks.
pub(crate) fn fixed_inputs<'a, const N: usize>(
    inputs: &[&'a [f32]],
    frames: usize,
) -> Result<[&'a [f32]; N], StageFault> {
    let blocks: [&[f32]; N] = inputs.try_into().map_err(|_| StageFault::InputMismatch {
        expected: N,
        actual: inputs.len(),
    })?;
    check_lengths(&blocks, frames)?;
    Ok(blocks)
}

pub(crate) fn check_lengths(inputs: &[&[f32]], frames: usize) -> Result<(), StageFault> {
    match inputs.iter().find(|block| block.len() != frames) {
        Some(block) => Err(StageFault::BlockLength {
            expected: frames,
            actual: block.len(),
        }),
        None => Ok(()),
    }
}

/// Instantiate the built-in stage for a declared kind.
pub fn build_stage(kind: &StageKind, sample_rate: f32) -> Box<dyn Stage> {
    let params = kind.params();
    let handle = |i: usize| params[i].handle();

    match kind {
        StageKind::Mixer { .. } => Box::new(MixerStage::new(handle(0))),
        StageKind::DryWet { .. } => Box::new(DryWetStage::new(handle(0))),
        StageKind::BitCrusher { .. } => {
            Box::new(BitCrushStage::new(handle(0), handle(1), handle(2)))
        }
        StageKind::Filter { .. } => Box::new(FilterStage::new(
            handle(0),
            handle(1),
            handle(2),
            handle(3),
        )),
        StageKind::Fatten { .. } => Box::new(FattenStage::new(sample_rate, handle(0), handle(1))),
        StageKind::MultiDelay { .. } => {
            Box::new(MultiDelayStage::new(sample_rate, handle(0), handle(1)))
        }
        StageKind::Reverb { .. } => Box::new(ReverbStage::new(sample_rate, handle(0), handle(1))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_inputs_checks_count_and_length() {
        let a = [0.0f32; 4];
        let b = [0.0f32; 3];

        assert!(fixed_inputs::<1>(&[&a], 4).is_ok());
        assert_eq!(
            fixed_inputs::<2>(&[&a], 4),
            Err(StageFault::InputMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            fixed_inputs::<2>(&[&a, &b], 4),
            Err(StageFault::BlockLength {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_built_stages_expose_declared_params() {
        let kind = StageKind::BitCrusher {
            bit_depth: 8.0,
            sample_rate: 10_000.0,
            balance: 1.0,
        };
        let stage = build_stage(&kind, 48_000.0);
        let names: Vec<_> = stage.params().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["bit_depth", "sample_rate", "balance"]);

        let depth = &stage.params()[0].1;
        assert_eq!(depth.get(), 8.0);
    }
}
