use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::layers::activation::Activation;
use crate::layers::conv1d::Conv1d;
use crate::layers::dense::Dense;
use crate::layers::dropout::Dropout;
use crate::layers::param::Param;
use crate::layers::pool::{crop_channels, pad_channels, GlobalAvgPool, MaxPool1d};
use crate::math::matrix::Matrix;
use crate::network::mode::Mode;
use crate::network::scorer::Scorer;
use crate::network::config::{BlockPlan, ResNetConfig};

/// Pre-activation residual block:
///
/// ```text
/// main: [act -> dropout ->] conv(stride?) -> act -> dropout -> conv
/// skip: [maxpool(stride)] -> [zero-pad channels]
/// out  = main + skip
/// ```
///
/// The first block skips the leading activation because the stem already
/// applied one.
#[derive(Debug)]
pub struct ResidualBlock {
    pub plan: BlockPlan,
    act1: Option<Activation>,
    do1: Option<Dropout>,
    conv1: Conv1d,
    act2: Activation,
    do2: Option<Dropout>,
    conv2: Conv1d,
    pool: Option<MaxPool1d>,
}

impl ResidualBlock {
    fn new(plan: BlockPlan, config: &ResNetConfig, rng: &mut StdRng, dropout_seed: u64) -> ResidualBlock {
        let stride = if plan.downsample { config.stride } else { 1 };
        let dropout = |offset: u64| {
            config
                .use_dropout
                .then(|| Dropout::new(config.dropout, dropout_seed.wrapping_add(offset)))
        };
        ResidualBlock {
            plan,
            act1: (!plan.is_first).then(|| Activation::new(config.activation)),
            do1: if plan.is_first { None } else { dropout(0) },
            conv1: Conv1d::new(plan.in_channels, plan.out_channels, config.kernel_size, stride, rng),
            act2: Activation::new(config.activation),
            do2: dropout(1),
            conv2: Conv1d::new(plan.out_channels, plan.out_channels, config.kernel_size, 1, rng),
            pool: plan.downsample.then(|| MaxPool1d::new(config.stride)),
        }
    }

    fn forward(&mut self, x: Vec<Matrix>, mode: Mode) -> Vec<Matrix> {
        let mut identity = x.clone();
        let mut out = x;

        if let Some(act) = self.act1.as_mut() {
            out = act.forward(out, mode);
        }
        if let Some(d) = self.do1.as_mut() {
            out = d.forward(out, mode);
        }
        out = self.conv1.forward(out, mode);
        out = self.act2.forward(out, mode);
        if let Some(d) = self.do2.as_mut() {
            out = d.forward(out, mode);
        }
        out = self.conv2.forward(out, mode);

        if let Some(pool) = self.pool.as_mut() {
            identity = pool.forward(identity, mode);
        }
        if self.plan.out_channels != self.plan.in_channels {
            identity = identity
                .iter()
                .map(|x| pad_channels(x, self.plan.out_channels))
                .collect();
        }

        for (o, skip) in out.iter_mut().zip(&identity) {
            o.add_assign(skip);
        }
        out
    }

    fn backward(&mut self, grad: Vec<Matrix>) -> Vec<Matrix> {
        let mut g_main = self.conv2.backward(grad.clone());
        if let Some(d) = self.do2.as_mut() {
            g_main = d.backward(g_main);
        }
        g_main = self.act2.backward(g_main);
        g_main = self.conv1.backward(g_main);
        if let Some(d) = self.do1.as_mut() {
            g_main = d.backward(g_main);
        }
        if let Some(act) = self.act1.as_mut() {
            g_main = act.backward(g_main);
        }

        let mut g_skip = grad;
        if self.plan.out_channels != self.plan.in_channels {
            g_skip = g_skip
                .iter()
                .map(|g| crop_channels(g, self.plan.in_channels))
                .collect();
        }
        if let Some(pool) = self.pool.as_mut() {
            g_skip = pool.backward(g_skip);
        }

        for (m, s) in g_main.iter_mut().zip(&g_skip) {
            m.add_assign(s);
        }
        g_main
    }

    fn params_mut(&mut self) -> impl Iterator<Item = &mut Param> {
        self.conv1.params_mut().into_iter().chain(self.conv2.params_mut())
    }

    fn params(&self) -> impl Iterator<Item = &Param> {
        self.conv1.params().into_iter().chain(self.conv2.params())
    }
}

/// Residual 1-D convolutional network for segment classification.
///
/// stem conv -> act -> residual blocks -> act -> global average -> dense.
/// Returns logits; softmax is folded into the cross-entropy loss.
#[derive(Debug)]
pub struct ResNet1d {
    pub config: ResNetConfig,
    stem: Conv1d,
    stem_act: Activation,
    blocks: Vec<ResidualBlock>,
    final_act: Activation,
    pool: GlobalAvgPool,
    head: Dense,
}

impl ResNet1d {
    /// Builds the network with weights drawn from a generator seeded by `seed`.
    ///
    /// The config is assumed to be validated (`ResNetConfig::validate`).
    pub fn new(config: ResNetConfig, seed: u64) -> ResNet1d {
        let mut rng = StdRng::seed_from_u64(seed);
        let stem = Conv1d::new(
            config.in_channels,
            config.base_filters,
            config.kernel_size,
            1,
            &mut rng,
        );
        let blocks = config
            .block_plan()
            .into_iter()
            .enumerate()
            .map(|(i, plan)| {
                let dropout_seed = seed.wrapping_add(1_000 + 2 * i as u64);
                ResidualBlock::new(plan, &config, &mut rng, dropout_seed)
            })
            .collect();
        let head = Dense::new(config.head_channels(), config.n_classes, &mut rng);

        ResNet1d {
            stem,
            stem_act: Activation::new(config.activation),
            blocks,
            final_act: Activation::new(config.activation),
            pool: GlobalAvgPool::new(),
            head,
            config,
        }
    }

    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// One-line description logged at start-up.
    pub fn summary(&self) -> String {
        let downsampling = self.blocks.iter().filter(|b| b.plan.downsample).count();
        format!(
            "ResNet1d: {} blocks ({} downsampling), {} -> {} channels, kernel {}, {} classes, {} parameters",
            self.blocks.len(),
            downsampling,
            self.config.base_filters,
            self.config.head_channels(),
            self.config.kernel_size,
            self.config.n_classes,
            self.param_count(),
        )
    }
}

impl Scorer for ResNet1d {
    fn n_classes(&self) -> usize {
        self.config.n_classes
    }

    fn forward(&mut self, batch: Vec<Matrix>, mode: Mode) -> Matrix {
        let mut x = self.stem.forward(batch, mode);
        x = self.stem_act.forward(x, mode);
        for block in &mut self.blocks {
            x = block.forward(x, mode);
        }
        x = self.final_act.forward(x, mode);
        let features = self.pool.forward(x, mode);
        self.head.forward(features, mode)
    }

    fn backward(&mut self, grad_scores: &Matrix) {
        let g_features = self.head.backward(grad_scores);
        let mut g = self.pool.backward(&g_features);
        g = self.final_act.backward(g);
        for block in self.blocks.iter_mut().rev() {
            g = block.backward(g);
        }
        g = self.stem_act.backward(g);
        self.stem.backward(g);
    }

    fn visit_params_mut(&mut self, f: &mut dyn FnMut(&mut Param)) {
        for p in self.stem.params_mut() {
            f(p);
        }
        for block in &mut self.blocks {
            for p in block.params_mut() {
                f(p);
            }
        }
        for p in self.head.params_mut() {
            f(p);
        }
    }

    fn visit_params(&self, f: &mut dyn FnMut(&Param)) {
        for p in self.stem.params() {
            f(p);
        }
        for block in &self.blocks {
            for p in block.params() {
                f(p);
            }
        }
        for p in self.head.params() {
            f(p);
        }
    }
}
