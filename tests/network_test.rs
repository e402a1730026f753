use digitprobe::network::*;
use digitprobe::quantization::QuantParams;
use digitprobe::tensor::{Shape, TensorI8};

fn unit() -> QuantParams {
    QuantParams::new(1.0, 0).unwrap()
}

fn tensor(shape: Shape, data: &[i8]) -> TensorI8 {
    TensorI8::from_vec(shape, data.to_vec()).unwrap()
}

#[test]
fn relu_clamps_at_zero_point() {
    let params = QuantParams::new(0.1, -3).unwrap();
    let input = tensor(Shape::flat(4), &[-10, -3, 0, 5]);
    let mut out = TensorI8::new1(4);

    let layer = ReLuLayerQ::new();
    let out_params = layer.fwd_i8(&input, &params, &mut out);

    assert_eq!(out.as_slice(), &[-3, -3, 0, 5]);
    assert_eq!(out_params, params, "relu keeps its input parameters");
}

#[test]
fn conv_sums_window() {
    let input = tensor(Shape::new(1, 3, 3), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let layer = Conv2dLayerQ::new(1, 1, 2, 1, 0, vec![1; 4], unit(), vec![0.0], unit());

    let shape = layer.output_shape(input.shape()).unwrap();
    assert_eq!(shape, Shape::new(1, 2, 2));
    let mut out = TensorI8::new(1, 2, 2);
    layer.fwd_i8(&input, &unit(), &mut out);
    assert_eq!(out.as_slice(), &[12, 16, 24, 28]);
}

#[test]
fn conv_padding_contributes_nothing() {
    let input = tensor(Shape::new(1, 3, 3), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let layer = Conv2dLayerQ::new(1, 1, 3, 1, 1, vec![1; 9], unit(), vec![0.0], unit());

    assert_eq!(layer.output_shape(input.shape()).unwrap(), Shape::new(1, 3, 3));
    let mut out = TensorI8::new(1, 3, 3);
    layer.fwd_i8(&input, &unit(), &mut out);
    assert_eq!(out.get(0, 0, 0), 12, "corner sees a 2x2 window");
    assert_eq!(out.get(0, 1, 1), 45, "centre sees the full input");
    assert_eq!(out.get(0, 2, 2), 28);
}

#[test]
fn conv_multiple_channels() {
    // 2 input channels, 2 output channels, 1x1 kernels.
    let input = tensor(Shape::new(2, 1, 2), &[1, 2, 10, 20]);
    let weights = vec![1, 1, 2, -1];
    let layer = Conv2dLayerQ::new(2, 2, 1, 1, 0, weights, unit(), vec![0.0, 0.0], unit());

    let mut out = TensorI8::new(2, 1, 2);
    layer.fwd_i8(&input, &unit(), &mut out);
    assert_eq!(out.as_slice(), &[11, 22, -8, -16]);
}

#[test]
fn linear_applies_weights_and_bias() {
    let input = tensor(Shape::flat(3), &[1, 2, 3]);
    let layer = LinearLayerQ::new(3, 2, vec![1, 2, 3, -1, 0, 1], unit(), vec![0.0, 0.5], unit());

    let mut out = TensorI8::new1(2);
    let params = layer.fwd_i8(&input, &unit(), &mut out);
    // 2 + 0.5 rounds away from zero.
    assert_eq!(out.as_slice(), &[14, 3]);
    assert_eq!(params, unit());
}

#[test]
fn linear_requantizes_with_zero_points() {
    let in_params = QuantParams::new(0.5, 10).unwrap();
    let w_params = QuantParams::new(0.25, 0).unwrap();
    let out_params = QuantParams::new(0.1, -5).unwrap();
    // Real input [1.0, 2.0], real weights [0.5, 0.5]: y = 1.5.
    let input = tensor(Shape::flat(2), &[12, 14]);
    let layer = LinearLayerQ::new(2, 1, vec![2, 2], w_params, vec![0.0], out_params);

    let mut out = TensorI8::new1(1);
    layer.fwd_i8(&input, &in_params, &mut out);
    assert_eq!(out.get(0, 0, 0), 10);
}

#[test]
fn linear_saturates() {
    let input = tensor(Shape::flat(2), &[100, 100]);
    let layer = LinearLayerQ::new(2, 2, vec![100, 100, -100, -100], unit(), vec![0.0, 0.0], unit());

    let mut out = TensorI8::new1(2);
    layer.fwd_i8(&input, &unit(), &mut out);
    assert_eq!(out.as_slice(), &[127, -128]);
}

#[test]
fn maxpool_picks_window_maximum() {
    let data: Vec<i8> = (0..16).map(|v| v - 8).collect();
    let input = tensor(Shape::new(1, 4, 4), &data);
    let layer = MaxPool2dLayerQ::new(2, 2, 0);

    assert_eq!(layer.output_shape(input.shape()).unwrap(), Shape::new(1, 2, 2));
    let mut out = TensorI8::new(1, 2, 2);
    layer.fwd_i8(&input, &unit(), &mut out);
    assert_eq!(out.as_slice(), &[-3, -1, 5, 7]);
}

#[test]
fn maxpool_padding_never_wins() {
    let input = tensor(Shape::new(1, 3, 3), &[-100; 9]);
    let layer = MaxPool2dLayerQ::new(2, 2, 1);

    let shape = layer.output_shape(input.shape()).unwrap();
    assert_eq!(shape, Shape::new(1, 2, 2));
    let mut out = TensorI8::new(1, 2, 2);
    layer.fwd_i8(&input, &unit(), &mut out);
    assert!(out.as_slice().iter().all(|&v| v == -100));
}

#[test]
fn flatten_keeps_chw_order() {
    let input = tensor(Shape::new(2, 1, 2), &[1, 2, 3, 4]);
    let layer = FlattenLayerQ::new();

    assert_eq!(layer.output_shape(input.shape()).unwrap(), Shape::flat(4));
    let mut out = TensorI8::new1(4);
    layer.fwd_i8(&input, &unit(), &mut out);
    assert_eq!(out.as_slice(), &[1, 2, 3, 4]);
}

fn small_network() -> Network {
    let mut net = Network::new(Shape::new(1, 4, 4), unit());
    net.add(Box::new(MaxPool2dLayerQ::new(2, 2, 0)));
    net.add(Box::new(FlattenLayerQ::new()));
    net.add(Box::new(ReLuLayerQ::new()));
    net.add(Box::new(LinearLayerQ::new(4, 1, vec![1; 4], unit(), vec![0.0], unit())));
    net
}

#[test]
fn plan_reports_shapes_and_memory() {
    let plan = small_network().plan().unwrap();
    assert_eq!(
        plan.shapes,
        vec![Shape::new(1, 2, 2), Shape::flat(4), Shape::flat(4), Shape::flat(1)]
    );
    assert_eq!(plan.output_shape, Shape::flat(1));
    assert_eq!(plan.output_params, unit());
    assert_eq!(plan.max_activation, 16, "input is the largest activation");
    assert_eq!(plan.weight_bytes, 4 + 4);
}

#[test]
fn forward_runs_all_layers() {
    let net = small_network();
    let input: Vec<i8> = (0..16).map(|v| v - 8).collect();
    let mut scratch = Scratch::new(16);

    let (out, params) = net.forward(&input, &mut scratch).unwrap();
    // maxpool -> [-3, -1, 5, 7], relu -> [0, 0, 5, 7], sum -> 12
    assert_eq!(out.shape(), Shape::flat(1));
    assert_eq!(out.as_slice(), &[12]);
    assert_eq!(params, unit());
}

#[test]
fn forward_is_repeatable() {
    let net = small_network();
    let input: Vec<i8> = (0..16).map(|v| v - 8).collect();
    let mut scratch = Scratch::new(16);

    let first = net.forward(&input, &mut scratch).unwrap().0.as_slice().to_vec();
    let second = net.forward(&input, &mut scratch).unwrap().0.as_slice().to_vec();
    assert_eq!(first, second);
}

#[test]
fn forward_rejects_short_input() {
    let net = small_network();
    let mut scratch = Scratch::new(16);
    let err = net.forward(&[0; 10], &mut scratch).err();
    assert_eq!(err, Some(ModelError::InputSize { expected: 16, actual: 10 }));
}

#[test]
fn forward_rejects_small_scratch() {
    let net = small_network();
    let mut scratch = Scratch::new(4);
    let err = net.forward(&[0; 16], &mut scratch).err();
    assert_eq!(err, Some(ModelError::ScratchTooSmall { needed: 16 }));
}

#[test]
fn plan_rejects_empty_network() {
    let net = Network::new(Shape::new(1, 4, 4), unit());
    assert_eq!(net.plan().err(), Some(ModelError::Empty));
}

#[test]
fn plan_rejects_mismatched_linear() {
    let mut net = Network::new(Shape::new(1, 4, 4), unit());
    net.add(Box::new(FlattenLayerQ::new()));
    net.add(Box::new(LinearLayerQ::new(15, 1, vec![1; 15], unit(), vec![0.0], unit())));

    match net.plan() {
        Err(ModelError::InvalidLayer { index, layer, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(layer, LayerType::Linear);
        }
        other => panic!("expected InvalidLayer, got {:?}", other.err()),
    }
}

#[test]
fn plan_rejects_oversized_kernel() {
    let mut net = Network::new(Shape::new(1, 4, 4), unit());
    net.add(Box::new(MaxPool2dLayerQ::new(5, 1, 0)));
    assert!(matches!(
        net.plan(),
        Err(ModelError::InvalidLayer { index: 0, layer: LayerType::MaxPool2d, .. })
    ));
}

#[test]
fn plan_rejects_wrong_weight_count() {
    let mut net = Network::new(Shape::new(1, 3, 3), unit());
    net.add(Box::new(Conv2dLayerQ::new(1, 2, 2, 1, 0, vec![1; 4], unit(), vec![0.0; 2], unit())));
    assert!(matches!(
        net.plan(),
        Err(ModelError::InvalidLayer { layer: LayerType::Conv2d, .. })
    ));
}

#[test]
fn layer_tags_roundtrip() {
    for layer in [
        LayerType::Conv2d,
        LayerType::Linear,
        LayerType::ReLu,
        LayerType::MaxPool2d,
        LayerType::Flatten,
    ] {
        assert_eq!(LayerType::from_tag(layer.tag()), Some(layer));
    }
    assert_eq!(LayerType::from_tag(0), None);
    assert_eq!(LayerType::from_tag(6), None);
}

fn conv_network() -> Network {
    let mut net = Network::new(Shape::new(1, 4, 4), QuantParams::new(0.5, -3).unwrap());
    net.add(Box::new(Conv2dLayerQ::new(
        1,
        2,
        3,
        1,
        1,
        (0..18).map(|v| v as i8 - 9).collect(),
        QuantParams::new(0.02, 0).unwrap(),
        vec![0.25, -0.5],
        QuantParams::new(0.2, 1).unwrap(),
    )));
    net.add(Box::new(ReLuLayerQ::new()));
    net.add(Box::new(MaxPool2dLayerQ::new(2, 2, 0)));
    net.add(Box::new(FlattenLayerQ::new()));
    net.add(Box::new(LinearLayerQ::new(
        8,
        3,
        (0..24).map(|v| (v * 7 % 11) as i8 - 5).collect(),
        QuantParams::new(0.05, 0).unwrap(),
        vec![0.1, 0.0, -0.1],
        QuantParams::new(0.3, -2).unwrap(),
    )));
    net
}

#[test]
fn encode_decode_preserves_network() {
    let net = conv_network();
    let bytes = net.encode();
    assert_eq!(&bytes[..4], &MODEL_MAGIC);

    let decoded = Network::decode(&bytes).unwrap();
    assert_eq!(decoded.num_layers(), net.num_layers());
    assert_eq!(decoded.input_shape(), net.input_shape());
    assert_eq!(decoded.input_params(), net.input_params());
    assert_eq!(decoded.encode(), bytes, "re-encoding must be byte-identical");

    let a = net.plan().unwrap();
    let b = decoded.plan().unwrap();
    assert_eq!(a.shapes, b.shapes);
    assert_eq!(a.output_params, b.output_params);

    let input: Vec<i8> = (0..16).map(|v| (v * 13 % 29) as i8 - 14).collect();
    let mut s1 = Scratch::new(a.max_activation);
    let mut s2 = Scratch::new(b.max_activation);
    let out1 = net.forward(&input, &mut s1).unwrap().0.as_slice().to_vec();
    let out2 = decoded.forward(&input, &mut s2).unwrap().0.as_slice().to_vec();
    assert_eq!(out1, out2);
}

// Offset of the first layer tag: magic, version, c/h/w, input params, layer count.
const FIRST_TAG: usize = 4 + 4 + 12 + 8 + 4;

#[test]
fn decode_rejects_bad_magic() {
    let mut bytes = small_network().encode();
    bytes[..4].copy_from_slice(b"XXXX");
    assert_eq!(Network::decode(&bytes).err(), Some(ModelError::BadMagic(*b"XXXX")));
}

#[test]
fn decode_rejects_unknown_version() {
    let mut bytes = small_network().encode();
    bytes[4..8].copy_from_slice(&2u32.to_le_bytes());
    assert_eq!(Network::decode(&bytes).err(), Some(ModelError::UnsupportedVersion(2)));
}

#[test]
fn decode_rejects_truncated_file() {
    let bytes = small_network().encode();
    for cut in [0, 3, FIRST_TAG, bytes.len() - 1] {
        assert!(
            matches!(Network::decode(&bytes[..cut]).err(), Some(ModelError::Truncated { .. })),
            "cut at {} should be reported as truncation",
            cut
        );
    }
}

#[test]
fn decode_rejects_unknown_tag() {
    let mut bytes = small_network().encode();
    bytes[FIRST_TAG] = 9;
    assert_eq!(
        Network::decode(&bytes).err(),
        Some(ModelError::UnknownLayer { tag: 9, index: 0 })
    );
}

#[test]
fn decode_rejects_trailing_bytes() {
    let mut bytes = small_network().encode();
    bytes.extend_from_slice(&[0, 0]);
    assert_eq!(Network::decode(&bytes).err(), Some(ModelError::TrailingBytes(2)));
}

#[test]
fn decode_rejects_invalid_params() {
    let mut bytes = small_network().encode();
    // Input scale follows magic, version and the three dimensions.
    bytes[20..24].copy_from_slice(&0.0f32.to_le_bytes());
    assert!(matches!(Network::decode(&bytes).err(), Some(ModelError::Params(_))));
}

#[test]
fn decode_rejects_huge_weight_count() {
    let mut w = ModelWriter::new();
    w.put_u8(MODEL_MAGIC[0]);
    w.put_u8(MODEL_MAGIC[1]);
    w.put_u8(MODEL_MAGIC[2]);
    w.put_u8(MODEL_MAGIC[3]);
    w.put_u32(MODEL_VERSION);
    w.put_dim(1);
    w.put_dim(1);
    w.put_dim(1);
    w.put_params(&unit());
    w.put_dim(1);
    w.put_u8(LayerType::Linear.tag());
    w.put_u32(u32::MAX);
    w.put_u32(u32::MAX);
    w.put_params(&unit());
    let bytes = w.into_bytes();

    let err = Network::decode(&bytes).err();
    assert!(
        matches!(err, Some(ModelError::Truncated { .. }) | Some(ModelError::DimensionOverflow)),
        "got {:?}",
        err
    );
}

#[test]
fn linear_large_fan_in_saturates() {
    // Every term is (-128 - 127) * 127, far past i32 once summed 70 000 times.
    let fan_in = 70_000;
    let in_params = QuantParams::new(1.0, 127).unwrap();
    let mut net = Network::new(Shape::new(1, 1, fan_in), in_params);
    net.add(Box::new(FlattenLayerQ::new()));
    net.add(Box::new(LinearLayerQ::new(
        fan_in,
        2,
        [vec![127; fan_in], vec![-127; fan_in]].concat(),
        unit(),
        vec![0.0, 0.0],
        unit(),
    )));
    let plan = net.plan().unwrap();
    let mut scratch = Scratch::new(plan.max_activation);

    let (out, _) = net.forward(&vec![-128; fan_in], &mut scratch).unwrap();
    assert_eq!(out.as_slice(), &[-128, 127]);
}

#[test]
fn conv_large_fan_in_saturates() {
    let channels = 70_000;
    let in_params = QuantParams::new(1.0, -128).unwrap();
    let input = tensor(Shape::new(channels, 1, 1), &vec![127; channels]);
    let layer = Conv2dLayerQ::new(channels, 1, 1, 1, 0, vec![127; channels], unit(), vec![0.0], unit());

    let mut out = TensorI8::new(1, 1, 1);
    layer.fwd_i8(&input, &in_params, &mut out);
    assert_eq!(out.get(0, 0, 0), 127);
}
