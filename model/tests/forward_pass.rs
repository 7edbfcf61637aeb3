use model::{ModelErr, NetworkModel, activations, dense};
use ndarray::{ArrayView1, array};

const IDENTITY_2X2: &[u8] = br#"{
    "dense1": {"kernel": [1, 0, 0, 1], "bias": [0, 0], "shape": [2, 2]},
    "dense2": {"kernel": [1, 0, 0, 1], "bias": [0, 0], "shape": [2, 2]}
}"#;

fn probabilities(model: &NetworkModel, input: &[f32]) -> Result<Vec<f32>, ModelErr> {
    let hidden = activations::relu(dense::forward(ArrayView1::from(input), model.layer1())?);
    let logits = dense::forward(hidden.view(), model.layer2())?;
    Ok(activations::softmax(logits.view())?.to_vec())
}

#[test]
fn identity_network_scores_the_hot_input() {
    let model = NetworkModel::from_json(IDENTITY_2X2).unwrap();

    let hidden = activations::relu(dense::forward(array![1., 0.].view(), model.layer1()).unwrap());
    assert_eq!(hidden, array![1., 0.]);

    let logits = dense::forward(hidden.view(), model.layer2()).unwrap();
    assert_eq!(logits, array![1., 0.]);

    let probs = activations::softmax(logits.view()).unwrap();
    assert!((probs[0] - 0.731).abs() < 1e-3);
    assert!((probs[1] - 0.269).abs() < 1e-3);
    assert_eq!(activations::argmax(probs.view()), Ok(0));
}

#[test]
fn hidden_layer_clips_negative_activations() {
    let bytes = br#"{
        "dense1": {"kernel": [-1, 1], "bias": [0, 0], "shape": [1, 2]},
        "dense2": {"kernel": [5, 0], "bias": [0], "shape": [2, 1]}
    }"#;
    let model = NetworkModel::from_json(bytes).unwrap();

    let hidden = activations::relu(dense::forward(array![2.].view(), model.layer1()).unwrap());
    assert_eq!(hidden, array![0., 2.]);
    assert_eq!(dense::forward(hidden.view(), model.layer2()).unwrap(), array![0.]);
}

#[test]
fn parsing_twice_is_bit_identical() {
    let a = NetworkModel::from_json(IDENTITY_2X2).unwrap();
    let b = NetworkModel::from_json(IDENTITY_2X2).unwrap();
    assert_eq!(a, b);

    let input = [0.3, 0.9];
    let pa = probabilities(&a, &input).unwrap();
    let pb = probabilities(&b, &input).unwrap();
    assert!(pa.iter().zip(&pb).all(|(x, y)| x.to_bits() == y.to_bits()));
}

#[test]
fn wrong_input_width_is_a_dimension_mismatch() {
    let model = NetworkModel::from_json(IDENTITY_2X2).unwrap();

    assert_eq!(
        probabilities(&model, &[1., 0., 0.]),
        Err(ModelErr::DimensionMismatch {
            got: 3,
            expected: 2
        })
    );
}
