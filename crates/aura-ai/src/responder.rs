//! Offline keyword responder
//!
//! Picks a supportive canned reply by topic when no chat endpoint is
//! available. Stateless apart from the random choice within a pool.

use rand::RngExt;

/// Greeting shown when a conversation starts
const WELCOME_MESSAGES: &[&str] = &[
    "Hi, I'm your wellness companion. I'm here to listen and to help you ease stress and anxiety.",
    "How are you feeling today? Is there anything you'd like to share with me?",
    "Remember, reaching out for help takes courage. We can talk about how you're feeling together.",
];

/// Shown after the conversation has been cleared
pub const CLEARED_MESSAGE: &str =
    "The conversation has been cleared. I'm your wellness companion; what would you like to talk about?";

/// Conversation topic detected from keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Anxiety,
    Stress,
    Sleep,
    Sadness,
    Anger,
    Loneliness,
    Greeting,
    Thanks,
    Breathing,
    Mindfulness,
    General,
}

// Checked in order; the first topic with a matching keyword wins.
const KEYWORDS: &[(Topic, &[&str])] = &[
    (Topic::Anxiety, &["anxious", "anxiety", "worried", "worry", "nervous", "焦虑", "担心", "紧张"]),
    (Topic::Stress, &["stress", "tired", "exhausted", "overwhelmed", "压力", "累", "疲惫"]),
    (Topic::Sleep, &["insomnia", "can't sleep", "cannot sleep", "sleep", "失眠", "睡不着", "睡眠"]),
    (Topic::Sadness, &["sad", "upset", "depressed", "悲伤", "难过", "沮丧"]),
    (Topic::Anger, &["angry", "anger", "furious", "irritated", "愤怒", "生气", "烦躁"]),
    (Topic::Loneliness, &["lonely", "alone", "isolated", "孤独", "孤单", "寂寞"]),
    (Topic::Greeting, &["hello", "你好", "嗨"]),
    (Topic::Thanks, &["thank", "谢谢"]),
    (Topic::Breathing, &["breath", "breathe", "relax", "呼吸", "放松"]),
    (Topic::Mindfulness, &["meditat", "mindful", "冥想", "正念"]),
];

impl Topic {
    /// Detect the topic of a message; unmatched input is [`Topic::General`].
    pub fn detect(input: &str) -> Self {
        let lowered = input.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|word| lowered.contains(word)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::General)
    }

    /// Candidate replies for this topic
    pub fn responses(self) -> &'static [&'static str] {
        match self {
            Topic::Anxiety => &[
                "I understand anxiety feels really uncomfortable. Try taking a deep breath; we'll get through this moment together. What you're feeling is real, and it makes sense.",
                "Anxiety is a normal human reaction. Would you like to tell me what's making you anxious? Sometimes saying it out loud is a release in itself.",
                "When anxiety shows up, remember it is a passing state and it will ease. You could try a breathing exercise, or tell me more about how you feel.",
            ],
            Topic::Stress => &[
                "It sounds like you're carrying a lot of pressure. That's very common in modern life. Would you like to share where the stress is coming from?",
                "When stress piles up, remember to be gentle with yourself. You've been working hard, and feeling tired is normal. We can look for ways to ease it together.",
                "When the pressure gets hard to bear, try pausing for a few deep breaths. Or we can talk about how to manage it better.",
            ],
            Topic::Sleep => &[
                "Trouble sleeping is really hard. Sleep matters so much for body and mind. Would you like to talk about what keeps you awake?",
                "When your thoughts get busy at night, try focusing on your breath or picturing a place that feels calm. Would you like me to guide you through a relaxation exercise?",
                "Sleep problems are often tied to stress and anxiety. We can explore ways to sleep better together, like building a bedtime routine.",
            ],
            Topic::Sadness => &[
                "I can feel your sadness. It hurts, but it's part of being human. Would you like to share what happened?",
                "Sadness deserves to be heard and understood. I'm here with you and I won't judge your feelings. Letting yourself feel them is often where healing begins.",
                "When sadness arrives, try to be patient and kind with yourself. These feelings won't last forever, and you don't have to face them alone.",
            ],
            Topic::Anger => &[
                "Anger is a normal emotion; it tells us something needs attention. Would you like to share what made you angry?",
                "When anger comes up, try taking a few deep breaths. Anger itself isn't the problem; what matters is expressing and handling it in a healthy way.",
                "I understand that feeling. Sometimes anger hides other emotions, like hurt or disappointment. We can explore those together.",
            ],
            Topic::Loneliness => &[
                "Loneliness is something all of us experience, but that doesn't mean you have to face it alone. I'm here with you, listening.",
                "Feeling lonely doesn't mean something is wrong with you. Many people feel this way these days. Would you like to talk about it?",
                "Connection is a basic human need. I'm an AI, but I'm always here for you. We can talk about building more meaningful connections.",
            ],
            Topic::Greeting => &[
                "Hello! I'm glad to chat with you. I'm here to help you work through emotions and stress. How has your day been?",
            ],
            Topic::Thanks => &[
                "You're welcome! I'm happy I could help. Remember, looking after your mental health really matters.",
            ],
            Topic::Breathing => &[
                "Breathing exercises are a great way to relax! You can try the breathing exercise, or I can guide you through a simple deep breath right here.",
                "Focusing on your breath eases stress and anxiety. Try this: breathe in slowly for 4 seconds, hold for 4 seconds, then breathe out slowly for 4 seconds.",
                "Your breath connects you to the present. When you feel stressed, coming back to it can help you find calm again. Would you like me to guide you?",
            ],
            Topic::Mindfulness => &[
                "Mindfulness is wonderful for mental health! It helps us live in the present and worry less about the past and the future.",
                "Mindfulness means noticing the present moment without judgment. You can start by simply observing your breath or your surroundings.",
                "Mindfulness isn't about stopping thoughts; it's about observing them without getting swept away. It takes practice, and it pays off.",
            ],
            Topic::General => &[
                "Thank you for sharing with me. I'm here to listen and support you on your wellness journey.",
                "Everyone's feelings are unique and important. Would you like to tell me more?",
                "I appreciate your courage in expressing yourself. We can keep talking about your feelings or thoughts.",
                "Remember, caring for your mental health matters as much as your physical health. Is there anything in particular you'd like to talk about?",
            ],
        }
    }
}

/// Greeting pool
pub fn welcome_messages() -> &'static [&'static str] {
    WELCOME_MESSAGES
}

/// Random greeting
pub fn welcome() -> &'static str {
    pick(WELCOME_MESSAGES)
}

/// Candidate replies for a message
pub fn response_pool(input: &str) -> &'static [&'static str] {
    Topic::detect(input).responses()
}

/// Random reply for a message
pub fn respond_offline(input: &str) -> &'static str {
    pick(response_pool(input))
}

fn pick(pool: &'static [&'static str]) -> &'static str {
    pool[rand::rng().random_range(0..pool.len())]
}
