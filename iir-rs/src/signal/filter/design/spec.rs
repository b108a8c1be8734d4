use iir_rs_core::complex::{lit, IirFloat};
use iir_rs_core::{Error, Result};

use super::domain::{prewarp, unwarp};
use super::{FilterBandType, FilterType, TranslationMethod};

/// A fully derived design request, ready for [`super::iirdesign_dyn`].
///
/// Band edges are analog frequencies in rad/sample (unit sample period),
/// already pre-warped when the bilinear transform is used with pre-warping.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpecification<F> {
    /// Prototype order; the cascade order doubles for band-pass/band-stop.
    pub order: usize,
    /// Band type.
    pub btype: FilterBandType,
    /// Approximation family with its ripple/attenuation.
    pub ftype: FilterType<F>,
    /// s-plane to z-plane mapping.
    pub translation: TranslationMethod,
    /// Sample rate in Hz.
    pub fs: F,
    /// Lower (or only) band edge.
    pub lower_band_edge: F,
    /// Upper band edge; equal to the lower edge for low-pass/high-pass.
    pub upper_band_edge: F,
    /// Geometric band centre for band-pass/band-stop, zero otherwise.
    pub omega_zero: F,
    /// Factor applied to the normalized prototype before the band transform.
    pub bandwidth: F,
    /// Frequency (Hz) at which the cascade gain is normalized.
    pub calibration_hz: F,
    /// Whether to normalize the cascade gain.
    pub normalize_gain: bool,
    /// Whether the stored edges went through [`prewarp`].
    pub prewarped: bool,
}

impl<F: IirFloat> FilterSpecification<F> {
    /// Derive the specification from band edges in Hz.
    ///
    /// Range checks on the edges, order and family parameters belong to
    /// the design kernel; this only rejects an edge count that does not
    /// match `btype`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_band_edges(
        order: usize,
        btype: FilterBandType,
        ftype: FilterType<F>,
        translation: TranslationMethod,
        prewarp_edges: bool,
        normalize_gain: bool,
        band_edges_hz: &[F],
        fs: F,
    ) -> Result<Self> {
        if band_edges_hz.len() != btype.edge_count() {
            return Err(Error::invalid_arg(
                "band_edges",
                "edge count does not match the band type",
            ));
        }

        let prewarped = prewarp_edges && translation == TranslationMethod::Bilinear;
        let to_analog = |hz: F| {
            let w = F::TAU() * hz / fs;
            if prewarped {
                prewarp(w)
            } else {
                w
            }
        };
        let w1 = to_analog(band_edges_hz[0]);
        let w2 = band_edges_hz.get(1).map_or(w1, |hz| to_analog(*hz));

        let half_rate = fs / lit(2.0);
        let (omega_zero, bandwidth, calibration_hz) = match btype {
            FilterBandType::Lowpass => (F::zero(), w1, F::zero()),
            FilterBandType::Highpass => (F::zero(), F::one() / w1, half_rate),
            FilterBandType::Bandpass => {
                let w0 = (w1 * w2).sqrt();
                let centre = match translation {
                    TranslationMethod::Bilinear => unwarp(w0),
                    TranslationMethod::MatchedZ => w0,
                };
                (w0, w2 - w1, centre * fs / F::TAU())
            }
            FilterBandType::Bandstop => ((w1 * w2).sqrt(), F::one() / (w2 - w1), F::zero()),
        };

        Ok(Self {
            order,
            btype,
            ftype,
            translation,
            fs,
            lower_band_edge: w1,
            upper_band_edge: w2,
            omega_zero,
            bandwidth,
            calibration_hz,
            normalize_gain,
            prewarped,
        })
    }

    /// Order of the digital cascade.
    pub fn effective_order(&self) -> usize {
        if self.btype.doubles_order() {
            2 * self.order
        } else {
            self.order
        }
    }

    /// Number of sections the cascade will hold.
    pub fn num_sections(&self) -> usize {
        self.effective_order().div_ceil(2)
    }
}
