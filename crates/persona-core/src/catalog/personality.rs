use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Identifier of a response profile.
///
/// The discriminant doubles as the index into [`super::Catalog`], so variants
/// must stay in declaration order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersonalityId {
    #[default]
    TechnicalExpert = 0,
    CreativePartner = 1,
    BusinessAdvisor = 2,
    LearningTutor = 3,
    HelpfulAssistant = 4,
}

/// One keyword rule: if `keyword` occurs in the lower-cased message, `body`
/// is the response.
#[derive(Debug, Clone, Copy)]
pub struct ResponseRule {
    pub keyword: &'static str,
    pub body: &'static str,
}

impl ResponseRule {
    const fn new(keyword: &'static str, body: &'static str) -> Self {
        Self { keyword, body }
    }

    /// `lowered` must already be lower-case.
    pub fn matches(&self, lowered: &str) -> bool {
        lowered.contains(self.keyword)
    }
}

/// A worked exchange shown to the model under the few-shot technique.
#[derive(Debug, Clone, Copy)]
pub struct FewShotExample {
    pub user: &'static str,
    pub assistant: &'static str,
}

/// Static description of a personality.
#[derive(Debug, Clone)]
pub struct Personality {
    pub id: PersonalityId,
    pub name: &'static str,
    pub description: &'static str,
    /// System prompt used when the local model formats a conversation.
    pub system_prompt: &'static str,
    pub strengths: &'static [&'static str],
    /// What a question is called in this personality's field, e.g. "business question".
    pub domain: &'static str,
    /// The role the model takes on under role playing.
    pub role: &'static str,
    pub example: Option<FewShotExample>,
    /// Evaluated in declaration order; the first match wins.
    pub rules: Vec<ResponseRule>,
    /// The single default used when no rule matches.
    pub fallback: &'static str,
}

impl Personality {
    /// Pick the response body for `message`.
    pub fn select(&self, message: &str) -> &'static str {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.body)
            .unwrap_or(self.fallback)
    }

    /// Keywords in evaluation order, reported as the personality's capabilities.
    pub fn keywords(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.keyword).collect()
    }

    pub fn builtin(id: PersonalityId) -> Self {
        match id {
            PersonalityId::TechnicalExpert => Self {
                id,
                name: "Technical Expert",
                description: "Senior software engineer and system architect",
                system_prompt: TECHNICAL_SYSTEM_PROMPT,
                strengths: &["Debugging expertise", "System design", "Best practices"],
                domain: "technical problem",
                role: "a senior software architect",
                example: Some(TECH_EXAMPLE),
                rules: vec![
                    ResponseRule::new("memory", TECH_MEMORY),
                    ResponseRule::new("performance", TECH_PERFORMANCE),
                    ResponseRule::new("debug", TECH_DEBUG),
                ],
                fallback: "I can help with technical challenges! Share more details about your specific issue - error messages, system specs, or performance metrics would be helpful for me to provide targeted solutions.",
            },
            PersonalityId::CreativePartner => Self {
                id,
                name: "Creative Writing Partner",
                description: "Award-winning creative writing mentor",
                system_prompt: CREATIVE_SYSTEM_PROMPT,
                strengths: &["Story development", "Character creation", "Creative inspiration"],
                domain: "creative challenge",
                role: "an award-winning creative writing mentor",
                example: Some(CREATIVE_EXAMPLE),
                rules: vec![
                    ResponseRule::new("story", CREATIVE_STORY),
                    ResponseRule::new("character", CREATIVE_CHARACTER),
                    ResponseRule::new("plot", CREATIVE_PLOT),
                ],
                fallback: "That sounds like an exciting creative project! What aspect would you like to explore first - character development, plot structure, world-building, or writing techniques?",
            },
            PersonalityId::BusinessAdvisor => Self {
                id,
                name: "Business Strategy Consultant",
                description: "Senior management consultant with Fortune 500 experience",
                system_prompt: BUSINESS_SYSTEM_PROMPT,
                strengths: &["Strategic analysis", "Market insights", "ROI optimization"],
                domain: "business question",
                role: "a senior management consultant",
                example: Some(BUSINESS_EXAMPLE),
                rules: vec![
                    ResponseRule::new("pricing", BUSINESS_PRICING),
                    ResponseRule::new("growth", BUSINESS_GROWTH),
                    ResponseRule::new("strategy", BUSINESS_STRATEGY),
                ],
                fallback: "Great business question! To provide strategic advice, could you share more context about your industry, target market, current business stage, and specific challenges you're facing?",
            },
            PersonalityId::LearningTutor => Self {
                id,
                name: "Learning Tutor",
                description: "Patient educator and knowledge mentor",
                system_prompt: "You are a patient educator who explains concepts step by step, checks understanding with questions, and uses concrete examples.",
                strengths: &["Clear explanations", "Step-by-step teaching", "Adaptive learning"],
                domain: "learning objective",
                role: "a patient tutor",
                example: None,
                rules: vec![
                    ResponseRule::new("explain", "Let me break this down step-by-step: 1) Start with the fundamental concepts, 2) Use real-world examples, 3) Build complexity gradually, 4) Practice with exercises. What specific topic would you like me to explain?"),
                    ResponseRule::new("learn", "Effective learning strategies: 1) Active recall through self-testing, 2) Spaced repetition for retention, 3) Connect new knowledge to existing understanding, 4) Practice application in different contexts. What are you trying to learn?"),
                    ResponseRule::new("understand", "To build understanding: 1) Break complex topics into smaller parts, 2) Use analogies and metaphors, 3) Ask questions to check comprehension, 4) Apply knowledge through practice. What concept are you struggling with?"),
                ],
                fallback: "I'm here to help you learn! Could you tell me more about your current understanding level and what specific aspect you'd like me to explain? I'll break it down step-by-step and use examples to make it clear.",
            },
            PersonalityId::HelpfulAssistant => Self {
                id,
                name: "General Assistant",
                description: "Versatile AI assistant for general questions and tasks",
                system_prompt: "You are a versatile, friendly assistant. Give balanced, practical answers and ask for details when a request is ambiguous.",
                strengths: &["Broad knowledge", "Balanced responses", "Adaptable communication"],
                domain: "question",
                role: "an expert in the field",
                example: None,
                rules: vec![
                    ResponseRule::new("help", "I'd be happy to help you! To provide the most useful assistance: 1) Share more details about your specific situation, 2) Let me know what you've already tried, 3) Tell me what outcome you're hoping for. What can I help you with?"),
                    ResponseRule::new("question", "That's a great question! To give you the best answer: 1) I'll consider multiple perspectives, 2) Provide practical solutions, 3) Suggest next steps you can take. What specific aspect would you like me to focus on?"),
                    ResponseRule::new("assist", "I'm here to assist you! My approach is to: 1) Understand your needs clearly, 2) Provide actionable advice, 3) Offer alternative solutions, 4) Follow up to ensure success. How can I best support you?"),
                ],
                fallback: "I'd be happy to help you with that! Could you provide a bit more detail about what you're looking for so I can give you the most useful response? I'm here to assist with information, analysis, and problem-solving.",
            },
        }
    }
}

// ── Canned text ───────────────────────────────────────────────────────────────

const TECH_EXAMPLE: FewShotExample = FewShotExample {
    user: "My React app is slow on mobile devices",
    assistant: "Let's optimize your React app for mobile performance. First, analyze your bundle size with webpack-bundle-analyzer, then add route-based code splitting with React.lazy() and Suspense, and serve WebP images at the right sizes. Which mobile issues are you seeing?",
};

const CREATIVE_EXAMPLE: FewShotExample = FewShotExample {
    user: "I want to write a thriller novel but I'm stuck on the plot",
    assistant: "Thrillers run on escalating tension. Start with three anchors: a ticking clock that creates urgency, stakes that make failure unbearable, and an antagonist who drives the conflict. What core fear do you want your story to explore?",
};

const BUSINESS_EXAMPLE: FewShotExample = FewShotExample {
    user: "How should I price my SaaS product?",
    assistant: "SaaS pricing starts from the value you deliver. Estimate the ROI for a typical customer, map competitor tiers, split SMB from enterprise needs, and check the price against your CAC and LTV targets. Who is your target market?",
};

const TECHNICAL_SYSTEM_PROMPT: &str = "You are a senior software architect and technical lead with 15+ years of experience in full-stack development, DevOps, and system design. Break problems into components, give step-by-step solutions, and focus on production-ready advice.";

const CREATIVE_SYSTEM_PROMPT: &str = "You are an award-winning creative writing mentor with deep knowledge of narrative structure, character development, and genre conventions. Be inspiring, specific, and supportive.";

const BUSINESS_SYSTEM_PROMPT: &str = "You are a senior management consultant and business strategist who has advised Fortune 500 companies and startups. Be analytical, evidence-based, and focused on measurable outcomes.";

const TECH_MEMORY: &str = r#"For Python API memory optimization, here's my systematic approach:

**1. Memory Profiling**
- Use `memory_profiler`: `pip install memory-profiler`
- Add `@profile` decorator to functions
- Run: `python -m memory_profiler your_script.py`

**2. Code Optimizations**
- Replace lists with generators for large datasets
- Use `__slots__` in classes to reduce memory overhead
- Implement connection pooling for databases
- Clear large variables with `del variable_name`

**3. Architecture Changes**
- Implement caching with Redis/Memcached
- Use streaming for large file processing
- Consider microservices for heavy operations

**4. Monitoring**
- Set up memory alerts
- Track memory usage over time
- Profile production regularly

What's your current memory usage pattern? Are you processing large files or handling many concurrent requests?"#;

const TECH_PERFORMANCE: &str = r#"API performance optimization strategy:

**1. Database Layer**
- Add proper indexes to frequently queried columns
- Use connection pooling (SQLAlchemy, psycopg2-pool)
- Optimize queries (avoid N+1 problems)
- Consider read replicas for scaling

**2. Application Layer**
- Implement async/await for I/O operations
- Use caching (Redis) for expensive computations
- Optimize serialization (use orjson instead of json)
- Profile with cProfile to find bottlenecks

**3. Infrastructure**
- Use load balancers for horizontal scaling
- Implement CDN for static assets
- Set up proper monitoring (DataDog, New Relic)
- Consider containerization with Docker

**4. Code Optimizations**
- Use list comprehensions over loops
- Avoid global variables
- Implement proper error handling
- Use appropriate data structures

What's your current API response time? Where are you seeing the biggest bottlenecks?"#;

const TECH_DEBUG: &str = r#"Systematic debugging approach for production issues:

**1. Information Gathering**
- Collect error logs, stack traces, and system metrics
- Reproduce the issue in a controlled environment
- Document when the issue started and what changed

**2. Isolation Strategy**
- Use binary search to narrow down the problem
- Comment out code sections to isolate the issue
- Test with minimal data sets

**3. Debugging Tools**
- Use `pdb` for interactive debugging: `import pdb; pdb.set_trace()`
- Add strategic logging with different levels
- Use IDE debuggers for complex logic
- Implement health checks and monitoring

**4. Testing & Validation**
- Write unit tests to prevent regression
- Use integration tests for API endpoints
- Implement automated testing in CI/CD

What specific error are you encountering? Do you have logs or stack traces to share?"#;

const CREATIVE_STORY: &str = r#"Exciting story concept! Let's develop this systematically:

**1. Core Elements**
- **Protagonist**: Who is your main character? What makes them unique?
- **Desire**: What do they want more than anything?
- **Obstacle**: What's preventing them from getting it?
- **Stakes**: What happens if they fail?

**2. Plot Structure**
- **Hook**: What grabs readers in the first chapter?
- **Inciting Incident**: What disrupts their normal world?
- **Rising Action**: How does tension escalate?
- **Climax**: Where does everything come to a head?
- **Resolution**: How is the conflict resolved?

**3. Story Development**
- **Theme**: What deeper meaning are you exploring?
- **Setting**: How does the world influence the story?
- **Voice**: What's your narrative style?
- **Pacing**: Balance action with character development

**4. Writing Process**
- Start with character motivation
- Outline major plot points
- Write consistently (daily word count goals)
- Don't edit while drafting

What genre are you envisioning? What's the emotional core of your story?"#;

const CREATIVE_CHARACTER: &str = r#"Character development is the heart of great storytelling:

**1. Psychology & Motivation**
- **Deepest Desire**: What do they want most in the world?
- **Greatest Fear**: What terrifies them?
- **Fatal Flaw**: What weakness could destroy them?
- **Internal Conflict**: How do they sabotage themselves?

**2. Background & History**
- **Defining Moment**: What past event shaped who they are?
- **Relationships**: How do they connect with others?
- **Secrets**: What are they hiding?
- **Beliefs**: What do they value most?

**3. Character Arc**
- **Starting Point**: Who are they at the beginning?
- **Catalyst**: What forces them to change?
- **Resistance**: How do they fight change?
- **Transformation**: Who do they become?

**4. Character Voice**
- **Speech Patterns**: How do they talk?
- **Thought Processes**: How do they think?
- **Actions**: What do they do under pressure?
- **Contradictions**: What makes them complex?

Who is your protagonist? What's their role in the story you want to tell?"#;

const CREATIVE_PLOT: &str = r#"Plot development techniques for compelling narratives:

**1. Story Structure**
- **Three-Act Structure**: Setup, confrontation, resolution
- **Hero's Journey**: Classic mythic structure
- **Save the Cat**: Modern screenplay structure
- **Freytag's Pyramid**: Traditional dramatic structure

**2. Conflict Development**
- **External Conflict**: What challenges face your character?
- **Internal Conflict**: What inner struggles do they have?
- **Interpersonal Conflict**: Relationship tensions
- **Societal Conflict**: Larger world issues

**3. Plot Techniques**
- **Plant and Payoff**: Set up elements that become important later
- **Rising Stakes**: Each obstacle should be bigger than the last
- **Ticking Clock**: Add urgency with time pressure
- **Red Herrings**: Misdirect readers (especially in mystery)

**4. Pacing Control**
- **Action Scenes**: Fast-paced, short sentences
- **Character Moments**: Slower, introspective scenes
- **Dialogue**: Reveals character and advances plot
- **Description**: Sets mood and atmosphere

What's your story's central conflict? What genre conventions are you working with?"#;

const BUSINESS_PRICING: &str = r#"Strategic SaaS pricing framework:

**1. Value-Based Foundation**
- **Customer ROI**: What measurable value do you deliver?
- **Willingness to Pay**: Survey customers about price sensitivity
- **Value Metrics**: Tie pricing to customer success metrics
- **Competitor Analysis**: Research 5-10 direct competitors

**2. Pricing Model Options**
- **Per-Seat Pricing**: Good for team collaboration tools
- **Usage-Based**: Align cost with customer value received
- **Tiered Pricing**: Good/Better/Best options
- **Freemium**: Free tier to drive adoption

**3. Market Segmentation**
- **SMB vs Enterprise**: Different needs, different budgets
- **Geographic Pricing**: Consider regional purchasing power
- **Vertical Pricing**: Industry-specific value propositions
- **Customer Size**: Scale pricing with customer growth

**4. Implementation Strategy**
- **Start Higher**: Easier to lower than raise prices
- **A/B Testing**: Test price points with small groups
- **Annual Discounts**: Encourage longer commitments
- **Grandfathering**: Protect existing customers during changes

What problem does your product solve? What's your target customer's current budget for this solution?"#;

const BUSINESS_GROWTH: &str = r#"Sustainable SaaS growth framework:

**1. Foundation First**
- **Product-Market Fit**: Ensure strong customer retention (>90% annually)
- **Unit Economics**: CAC should be <3x monthly revenue
- **Customer Success**: Focus on onboarding and support
- **Feedback Loops**: Continuous product improvement

**2. Growth Channels**
- **Content Marketing**: SEO, blogs, thought leadership
- **Paid Acquisition**: Google Ads, LinkedIn, Facebook
- **Partnerships**: Integration partners, referral programs
- **Product-Led Growth**: Viral mechanics, self-service signup

**3. Optimization Strategy**
- **Conversion Funnel**: Optimize each stage of customer journey
- **Cohort Analysis**: Track customer behavior over time
- **A/B Testing**: Continuously test messaging and features
- **Customer Segmentation**: Personalize experience by segment

**4. Scaling Considerations**
- **Team Building**: Hire ahead of growth curves
- **Systems & Processes**: Automate repetitive tasks
- **Financial Planning**: Manage cash flow and runway
- **Risk Management**: Diversify customer base and revenue

What's your current Monthly Recurring Revenue (MRR)? What's your biggest growth bottleneck right now?"#;

const BUSINESS_STRATEGY: &str = r#"Strategic business planning methodology:

**1. Market Analysis**
- **Total Addressable Market (TAM)**: How big is the opportunity?
- **Serviceable Addressable Market (SAM)**: What portion can you target?
- **Market Trends**: Is the market growing or contracting?
- **Competitive Landscape**: Who are the major players?

**2. Competitive Positioning**
- **Unique Value Proposition**: What makes you different?
- **Competitive Advantages**: What's defensible long-term?
- **SWOT Analysis**: Strengths, weaknesses, opportunities, threats
- **Blue Ocean Strategy**: Create uncontested market space

**3. Strategic Options**
- **Market Penetration**: Grow share in existing markets
- **Market Development**: Enter new geographic/demographic markets
- **Product Development**: Create new offerings for existing customers
- **Diversification**: New products for new markets

**4. Execution Planning**
- **OKRs**: Objectives and Key Results framework
- **Resource Allocation**: Budget, team, time priorities
- **Risk Assessment**: Identify and mitigate key risks
- **Success Metrics**: Define measurable outcomes

What's your primary strategic challenge? Are you looking to scale existing business or explore new opportunities?"#;
