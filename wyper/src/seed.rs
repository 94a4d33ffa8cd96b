//! Sample content bundled into the binary for first-run seeding.

pub struct SeedDocument {
    pub slug: &'static str,
    pub content: &'static str,
}

pub const SEED_POSTS: &[SeedDocument] = &[
    SeedDocument {
        slug: "welcome",
        content: include_str!("../seed/welcome.md"),
    },
    SeedDocument {
        slug: "react-hooks-deep-dive",
        content: include_str!("../seed/react-hooks-deep-dive.md"),
    },
    SeedDocument {
        slug: "rust-for-web",
        content: include_str!("../seed/rust-for-web.md"),
    },
    SeedDocument {
        slug: "css-grid-layout",
        content: include_str!("../seed/css-grid-layout.md"),
    },
    SeedDocument {
        slug: "socketio-chat",
        content: include_str!("../seed/socketio-chat.md"),
    },
];

/// JSON array of chat messages, stored verbatim.
pub const SEED_CHAT: &str = include_str!("../seed/chat.json");
