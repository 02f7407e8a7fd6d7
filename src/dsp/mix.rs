//! Summing and dry/wet blending.

/*
Two operations cover every mixing need in a patch:

  summing     out += input × gain, once per input. Used by mixer stages and
              by instruments adding their voices together. Nothing is
              normalized; the mixer's own `gain` is the level control.

  dry/wet     out = dry × (1 - balance) + wet × balance
              A linear crossfade: the weights always sum to 1, so two signals
              that peak at 1.0 never blend above 1.0. At balance 0 the output
              IS the dry signal and at balance 1 it IS the wet signal, with no
              rounding from the other side.

Linear crossfades dip slightly in perceived loudness at balance 0.5 for
uncorrelated inputs. For effect sends that is fine; an equal-power law is not
used here.
*/

/// `out[i] += input[i] * gain` over the shorter of the two.
#[inline]
pub fn accumulate(out: &mut [f32], input: &[f32], gain: f32) {
    for (o, &x) in out.iter_mut().zip(input.iter()) {
        *o += x * gain;
    }
}

/// Blend one sample pair. Exact at the endpoints.
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, balance: f32) -> f32 {
    if balance <= 0.0 {
        dry
    } else if balance >= 1.0 {
        wet
    } else {
        dry * (1.0 - balance) + wet * balance
    }
}

/// Crossfade two buffers into `out`.
pub fn crossfade(dry: &[f32], wet: &[f32], balance: f32, out: &mut [f32]) {
    debug_assert_eq!(dry.len(), out.len());
    debug_assert_eq!(wet.len(), out.len());

    for ((o, &d), &w) in out.iter_mut().zip(dry.iter()).zip(wet.iter()) {
        *o = blend_dry_wet(d, w, balance);
    }
}

/// Blend `dry` into an effect buffer that currently holds the wet signal.
pub fn apply_dry_wet(dry: &[f32], wet: &mut [f32], balance: f32) {
    debug_assert_eq!(dry.len(), wet.len());

    for (w, &d) in wet.iter_mut().zip(dry.iter()) {
        *w = blend_dry_wet(d, *w, balance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_scales_and_sums() {
        let mut out = [1.0, 1.0, 1.0];
        accumulate(&mut out, &[1.0, 2.0, 3.0], 0.5);
        assert_eq!(out, [1.5, 2.0, 2.5]);
    }

    #[test]
    fn test_crossfade_endpoints_are_exact() {
        let dry = [0.1, -0.3, 0.7];
        let wet = [0.9, 0.2, -0.4];
        let mut out = [0.0; 3];

        crossfade(&dry, &wet, 0.0, &mut out);
        assert_eq!(out, dry);

        crossfade(&dry, &wet, 1.0, &mut out);
        assert_eq!(out, wet);
    }

    #[test]
    fn test_crossfade_midpoint() {
        let mut out = [0.0; 2];
        crossfade(&[1.0, 0.0], &[0.0, 1.0], 0.5, &mut out);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_weights_never_boost() {
        let dry = [1.0; 8];
        let wet = [1.0; 8];
        let mut out = [0.0; 8];
        for step in 0..=10 {
            crossfade(&dry, &wet, step as f32 / 10.0, &mut out);
            assert!(out.iter().all(|&s| s <= 1.0 + 1e-6));
        }
    }

    #[test]
    fn test_apply_dry_wet_in_place() {
        let dry = [1.0, 1.0];
        let mut wet = [0.0, 0.5];
        apply_dry_wet(&dry, &mut wet, 0.25);
        assert!((wet[0] - 0.75).abs() < 1e-6);
        assert!((wet[1] - 0.875).abs() < 1e-6);
    }
}
