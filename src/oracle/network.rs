use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::tensor::activation::sigmoid;

/// Position value network.
///
/// ```text
/// Input:   [batch, size*size]   one feature per cell
/// Hidden:  Linear -> ReLU, once per entry of `hidden_layers`
/// Output:  Linear -> 1, sigmoid  =>  [batch, 1]  P(X wins)
/// ```
#[derive(Module, Debug)]
pub struct ValueNetwork<B: Backend> {
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct ValueNetworkConfig {
    pub inputs: usize,
    pub hidden_layers: Vec<usize>,
}

impl ValueNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ValueNetwork<B> {
        let mut hidden = Vec::with_capacity(self.hidden_layers.len());
        let mut width = self.inputs;
        for &units in &self.hidden_layers {
            hidden.push(LinearConfig::new(width, units).init(device));
            width = units;
        }

        ValueNetwork {
            hidden,
            output: LinearConfig::new(width, 1).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> ValueNetwork<B> {
    /// Forward pass: input [batch, cells] -> output [batch, 1] in (0, 1).
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = input;
        for layer in &self.hidden {
            x = self.relu.forward(layer.forward(x));
        }
        sigmoid(self.output.forward(x))
    }
}
