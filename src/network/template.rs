use crate::quantization::{quantize, QuantParams};
use crate::samples::{SampleStore, IMAGE_LEN, IMAGE_SIDE, NUM_CLASSES};
use crate::tensor::Shape;

use super::{FlattenLayerQ, LinearLayerQ, Network};

/// Zero point of the template output. Scores are scaled so that a sample's match with its
/// own template lands near `OUTPUT_ZERO_POINT + 100`.
const OUTPUT_ZERO_POINT: i32 = -28;

impl Network {
    /// A template-matching classifier built from `store`: one linear layer whose row for
    /// class `c` is the mean-centred, unit-norm image labelled `c`. The first sample of
    /// each label wins; labels without a sample get an all-zero row.
    pub fn template(store: &SampleStore) -> Network {
        let mut rows = vec![[0f32; IMAGE_LEN]; NUM_CLASSES];
        let mut filled = [false; NUM_CLASSES];
        for sample in store.iter() {
            let class = sample.label as usize;
            if filled[class] {
                continue;
            }
            filled[class] = true;
            let row = &mut rows[class];
            let mean = sample.image.iter().map(|&p| p as f32).sum::<f32>() / (255.0 * IMAGE_LEN as f32);
            for (w, &p) in row.iter_mut().zip(sample.image.iter()) {
                *w = p as f32 / 255.0 - mean;
            }
            let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            // A blank image leaves an all-zero row.
            if norm > f32::EPSILON {
                row.iter_mut().for_each(|v| *v /= norm);
            }
        }

        let max_abs = rows.iter().flatten().fold(0.0f32, |m, v| m.max(v.abs()));
        let weight_params = QuantParams::symmetric(max_abs);
        let weights: Vec<i8> = rows
            .iter()
            .flatten()
            .map(|&v| quantize(v, &weight_params))
            .collect();

        // Largest self-match decides the output scale.
        let best = store
            .iter()
            .map(|sample| {
                let row = &rows[sample.label as usize];
                row.iter()
                    .zip(sample.image.iter())
                    .map(|(w, &p)| w * p as f32 / 255.0)
                    .sum::<f32>()
            })
            .fold(0.0f32, f32::max);
        let output_params = QuantParams::new((best / 100.0).max(1e-3), OUTPUT_ZERO_POINT)
            .unwrap_or_else(|_| QuantParams::symmetric(1.0));

        let mut net = Network::new(Shape::new(1, IMAGE_SIDE, IMAGE_SIDE), QuantParams::PIXEL);
        net.add(Box::new(FlattenLayerQ::new()));
        net.add(Box::new(LinearLayerQ::new(
            IMAGE_LEN,
            NUM_CLASSES,
            weights,
            weight_params,
            vec![0.0; NUM_CLASSES],
            output_params,
        )));
        net
    }
}
