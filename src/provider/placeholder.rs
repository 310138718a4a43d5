use async_trait::async_trait;
use futures::{stream, StreamExt};
use tracing::debug;

use super::{ChunkStream, Draft, ProviderError, TextGenerator};

/// Local stand-in used when no provider credential is configured. Produces a
/// fixed long-form article about the topic without any network access.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderProvider;

impl PlaceholderProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn title_for(topic: &str) -> String {
        format!("Understanding {topic}: A Comprehensive Guide")
    }

    pub fn article(topic: &str) -> String {
        format!(
            r#"# Understanding {topic}

## Introduction

{topic} is a fascinating and rapidly evolving field that has captured the attention of researchers, businesses, and the general public alike. In this comprehensive guide, we'll explore the key aspects, current developments, and future implications of {topic}.

## What is {topic}?

{topic} represents a significant advancement in modern technology and thinking. It encompasses various methodologies, tools, and approaches that are reshaping how we understand and interact with complex systems. Rather than being a single product or technique, it is best understood as a collection of ideas that reinforce one another, and its value grows as those ideas are applied together.

## A Brief History

Like most important developments, {topic} did not appear overnight. Early practitioners experimented with small, isolated ideas that only later came together into a coherent discipline. As tooling matured and communities formed around shared problems, the practices that define {topic} today were refined through years of trial, error, and open discussion. Understanding this history helps explain why certain conventions exist and why some early approaches were eventually abandoned.

## Key Benefits

Understanding {topic} offers several advantages:

- **Enhanced Efficiency**: {topic} streamlines processes and reduces complexity
- **Innovation Driver**: It opens new possibilities for creative solutions
- **Future-Ready**: Prepares organizations and individuals for upcoming challenges
- **Competitive Advantage**: Early adoption provides strategic benefits

## Current Applications

Today, {topic} is being implemented across various sectors:

### Technology Sector

Companies are leveraging {topic} to improve their products and services, creating more intuitive and powerful solutions for end-users. Engineering teams use it to shorten feedback loops, reduce operational toil, and ship changes with greater confidence.

### Healthcare Industry

Medical professionals utilize {topic} to enhance patient care, improve diagnostic accuracy, and streamline treatment protocols. Administrative staff benefit as well, since better processes free up time that can be redirected toward patients.

### Education Field

Educational institutions incorporate {topic} to create more engaging learning experiences and personalized educational pathways. Students gain practical skills, while instructors gain better insight into where learners struggle.

## Implementation Strategies

When considering {topic} implementation, organizations should:

1. **Assess Current Capabilities**: Evaluate existing infrastructure and resources
2. **Define Clear Objectives**: Establish measurable goals and success metrics
3. **Develop Phased Approach**: Implement gradually to minimize disruption
4. **Invest in Training**: Ensure team members have necessary skills and knowledge
5. **Monitor and Adjust**: Continuously evaluate progress and make improvements

## Common Misconceptions

Because {topic} attracts so much attention, it is surrounded by a number of myths. Some people believe it is only relevant to large enterprises, while others assume it requires a complete overhaul of existing systems. In practice, small teams often see the fastest returns, and incremental adoption is usually more successful than a dramatic rewrite. Another common misconception is that {topic} removes the need for human judgment; in reality, it amplifies good judgment and exposes poor decisions more quickly.

## Challenges and Considerations

While {topic} offers tremendous potential, there are important considerations:

- **Technical Complexity**: Requires specialized knowledge and expertise
- **Resource Requirements**: May demand significant time and financial investment
- **Change Management**: Organizations must adapt to new processes and methodologies
- **Ethical Implications**: Consider the broader impact on society and stakeholders

## Measuring Success

Adopting {topic} without a way to measure its impact makes it difficult to justify continued investment. Useful indicators include time saved on recurring tasks, reductions in error rates, improvements in customer satisfaction, and the speed at which new ideas move from proposal to production. Teams should agree on a small set of metrics before they begin, record a baseline, and revisit the numbers regularly so that decisions are grounded in evidence rather than enthusiasm.

## Future Outlook

The future of {topic} looks incredibly promising. As technology continues to advance and our understanding deepens, we can expect to see:

- More sophisticated applications and use cases
- Increased accessibility and user-friendly implementations
- Better integration with existing systems and processes
- Enhanced collaboration between different sectors and disciplines

## Getting Started

If you are new to {topic}, begin with a small, well-defined problem that matters to you or your team. Read a few trusted introductory resources, build something modest end to end, and write down what surprised you along the way. Share those notes with colleagues, invite feedback, and use what you learn to decide where to go next. Momentum built on early, visible wins makes it far easier to tackle larger challenges later.

## Best Practices

To maximize the benefits of {topic}, consider these best practices:

- Stay informed about latest developments and trends
- Collaborate with experts and industry leaders
- Maintain a focus on user needs and experiences
- Regularly evaluate and update your approach
- Foster a culture of continuous learning and improvement

## Conclusion

{topic} represents a transformative force that will continue to shape our world in profound ways. By understanding its principles, applications, and implications, we can better prepare for the future and harness its potential for positive change.

Whether you're a business leader, researcher, educator, or simply someone interested in emerging trends, {topic} offers valuable insights and opportunities for growth and innovation.

As we move forward, it's essential to approach {topic} with both enthusiasm and responsibility, ensuring that its development and implementation benefit society as a whole."#
        )
    }
}

#[async_trait]
impl TextGenerator for PlaceholderProvider {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn generate(&self, topic: &str) -> Result<Draft, ProviderError> {
        debug!(%topic, "serving placeholder article");
        Ok(Draft {
            title: Some(Self::title_for(topic)),
            content: Self::article(topic),
        })
    }

    async fn generate_stream(&self, topic: &str) -> Result<ChunkStream, ProviderError> {
        debug!(%topic, "streaming placeholder article");
        let lines: Vec<Result<String, ProviderError>> = Self::article(topic)
            .split_inclusive('\n')
            .map(|l| Ok(l.to_string()))
            .collect();
        Ok(stream::iter(lines).boxed())
    }
}
