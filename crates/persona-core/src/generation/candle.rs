//! Qwen2 causal LM on the CPU via candle, weights fetched from the Hugging Face hub.

use std::path::Path;
use std::sync::Mutex;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::qwen2::{Config as QwenConfig, ModelForCausalLM};
use hf_hub::api::sync::ApiBuilder;
use tokenizers::Tokenizer;
use tracing::debug;

use super::model::{GenerationError, TextGenerator};
use super::prompt::tail_window;
use super::GenerationConfig;

const EOS_TOKENS: [&str; 2] = ["<|endoftext|>", "<|im_end|>"];
const REPEAT_LAST_N: usize = 64;
const SEED: u64 = 299_792_458;

pub(crate) struct CandleGenerator {
    name: String,
    model: Mutex<ModelForCausalLM>,
    tokenizer: Tokenizer,
    device: Device,
    eos: Vec<u32>,
}

impl CandleGenerator {
    pub(crate) fn load(model_id: &str, cache_dir: Option<&Path>) -> Result<Self, GenerationError> {
        let load_err = |message: String| GenerationError::Load {
            model: model_id.to_owned(),
            message,
        };

        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir.to_path_buf());
        }
        let api = builder.build().map_err(|e| load_err(e.to_string()))?;
        let repo = api.model(model_id.to_owned());

        let config_path = repo.get("config.json").map_err(|e| load_err(e.to_string()))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| load_err(e.to_string()))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| load_err(e.to_string()))?;

        let raw = std::fs::read(&config_path).map_err(|e| load_err(e.to_string()))?;
        let config: QwenConfig =
            serde_json::from_slice(&raw).map_err(|e| load_err(e.to_string()))?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| load_err(e.to_string()))?;

        let device = Device::Cpu;
        // SAFETY: the safetensors file lives in the hub cache and is not
        // modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = ModelForCausalLM::new(&config, vb)?;

        let eos = EOS_TOKENS
            .iter()
            .filter_map(|t| tokenizer.token_to_id(t))
            .collect();

        Ok(Self {
            name: model_id.to_owned(),
            model: Mutex::new(model),
            tokenizer,
            device,
            eos,
        })
    }
}

impl TextGenerator for CandleGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| GenerationError::Generate(e.to_string()))?;
        let mut tokens = tail_window(encoding.get_ids(), config.context_tokens).to_vec();
        let prompt_len = tokens.len();

        let sampling = if config.temperature <= 0.0 {
            Sampling::ArgMax
        } else {
            Sampling::TopKThenTopP {
                k: config.top_k,
                p: config.top_p,
                temperature: config.temperature,
            }
        };
        let mut processor = LogitsProcessor::from_sampling(SEED, sampling);

        // A timed-out generation may still hold the model; fail fast instead of queueing.
        let mut model = self.model.try_lock()?;
        model.clear_kv_cache();

        let mut offset = 0;
        for step in 0..config.max_new_tokens {
            let context = if step == 0 {
                &tokens[..]
            } else {
                &tokens[tokens.len() - 1..]
            };
            let input = Tensor::new(context, &self.device)?.unsqueeze(0)?;
            let logits = model.forward(&input, offset)?;
            offset += context.len();

            let logits = logits.squeeze(0)?.squeeze(0)?.to_dtype(DType::F32)?;
            let logits = if config.repetition_penalty == 1.0 {
                logits
            } else {
                let start = tokens.len().saturating_sub(REPEAT_LAST_N);
                candle_transformers::utils::apply_repeat_penalty(
                    &logits,
                    config.repetition_penalty,
                    &tokens[start..],
                )?
            };

            let next = processor.sample(&logits)?;
            if self.eos.contains(&next) {
                break;
            }
            tokens.push(next);
        }

        debug!(
            model = %self.name,
            prompt_tokens = prompt_len,
            new_tokens = tokens.len() - prompt_len,
            "generation finished"
        );
        self.tokenizer
            .decode(&tokens[prompt_len..], true)
            .map_err(|e| GenerationError::Generate(e.to_string()))
    }
}
