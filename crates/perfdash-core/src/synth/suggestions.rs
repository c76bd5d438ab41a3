use crate::scenario::{classify, Scenario};
use crate::synth::model::Suggestion;

/// Advice for baseline runs: the next optimizations worth applying, with
/// projected gains.
const NEXT_STEPS: [(&str, &str); 4] = [
    (
        "Enable KV cache prefix reuse",
        "About 62% of requests share the same system prompt prefix (1,200 tokens on average). \
         Enabling prefix caching should cut TTFT by 40-55% and free roughly 15% of GPU memory. \
         Set enable_prefix_caching=true in the inference engine configuration.",
    ),
    (
        "Tune the batch scheduler",
        "max_batch_size is 32, but requests wait 450ms in the queue on average at peak. \
         Raising max_batch_size to 64 and enabling continuous batching should bring P90 \
         end-to-end latency from 3.8s down to 2.5s and lift throughput by about 30%.",
    ),
    (
        "Lower quantization precision",
        "The model runs in FP16 with GPU memory utilization at 92%. Trying INT8/AWQ \
         quantization keeps output quality within a 0.5% perplexity increase while cutting \
         memory use by about 45% and raising TPS by 20-35%.",
    ),
    (
        "Add tensor parallelism",
        "TPOT P99 is 85ms, so the decode stage is the bottleneck. With spare GPUs, raising \
         tensor_parallel_size from 1 to 2 should reduce TPOT by 35-40% and noticeably improve \
         long-form generation.",
    ),
];

/// Advice for optimized runs: confirmation of what the applied changes
/// measurably delivered.
const APPLIED: [(&str, &str); 4] = [
    (
        "Prefix caching is effective",
        "Cached tokens now cover 55-85% of each prompt. Average TTFT fell from 523.6ms to \
         92.4ms (-82%) and P99 TTFT from 1245.8ms to 215.3ms. Keep enable_prefix_caching=true \
         and keep system prompts byte-identical across requests to preserve the hit rate.",
    ),
    (
        "Continuous batching is absorbing peak load",
        "Average end-to-end latency dropped from 2856.4ms to 1285.7ms (-55%) and P90 from \
         4620.7ms to 2150.8ms. Queue wait is no longer the dominant cost; revisit \
         max_batch_size only if traffic grows by more than 50%.",
    ),
    (
        "Decode throughput is up",
        "Average TPS rose from 38.2 to 68.5 (+79%) and TPOT fell from 32.8ms to 18.6ms \
         (-43%). Output quality checks show no regression after quantization.",
    ),
    (
        "Watch the long-context tail",
        "Requests above 8K tokens still account for most P99 E2E latency (3240.6ms). \
         Consider chunked prefill for long prompts before scaling out further.",
    ),
];

/// The four tuning suggestions for a task's cohort.
pub fn suggestions(task_id: &str) -> Vec<Suggestion> {
    let set = match classify(task_id) {
        Scenario::Optimized => &APPLIED,
        Scenario::Baseline => &NEXT_STEPS,
    };
    set.iter()
        .map(|(title, content)| Suggestion {
            title: title.to_string(),
            content: content.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_four_per_scenario() {
        assert_eq!(suggestions("task-optimized-gpt4o-20260210").len(), 4);
        assert_eq!(suggestions("task-baseline-gpt4o-20260201").len(), 4);
    }

    #[test]
    fn scenarios_get_different_advice() {
        let o = suggestions("task-optimized-gpt4o-20260210");
        let b = suggestions("task-baseline-gpt4o-20260201");
        assert_ne!(o, b);
        assert_eq!(b[0].title, "Enable KV cache prefix reuse");
        assert!(o[0].content.contains("92.4ms"));
    }

    #[test]
    fn content_is_fixed_across_calls() {
        assert_eq!(suggestions("a"), suggestions("b"));
    }
}
