//! Static planner archetypes and the deterministic selection rules.
//!
//! Archetype choice drives everything downstream: the page recipe the PDF
//! renderer walks, the preview pages, and the cover copy. Selection is keyword
//! matching first, then a hash of the slug, so the same input row always maps
//! to the same product.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Archetype {
    pub key: &'static str,
    pub niche: &'static str,
    pub recipe: &'static [&'static str],
    pub preview_pages: [usize; 3],
    pub cover_subtitle: &'static str,
    pub included_lines: &'static [&'static str],
    pub howto_lines: &'static [&'static str],
}

pub const THEMES: [&str; 3] = ["blue_minimal", "charcoal_mono", "warm_neutral"];

const BUDGET_KEYS: [&str; 5] = [
    "cash_flow",
    "bills_due",
    "debt_payoff",
    "annual_overview",
    "savings_goal",
];

const ADHD_KEYS: [&str; 5] = [
    "brain_dump",
    "focus_blocks",
    "routine_builder",
    "weekly_review",
    "project_planner",
];

pub const ARCHETYPES: [Archetype; 10] = [
    Archetype {
        key: "cash_flow",
        niche: "BUDGET",
        recipe: &[
            "cover",
            "quick_start",
            "cashflow_monthly",
            "cashflow_weekly",
            "bills_due_table",
            "expense_log",
            "sinking_funds",
            "notes_summary",
        ],
        preview_pages: [0, 2, 3],
        cover_subtitle: "Cash flow clarity in minutes a day",
        included_lines: &[
            "Monthly and weekly cash flow pages",
            "Bills due table plus expense log",
            "Sinking funds tracker and notes",
        ],
        howto_lines: &[
            "Print only the pages you need",
            "Fill one line per transaction",
            "Review weekly and adjust quickly",
        ],
    },
    Archetype {
        key: "bills_due",
        niche: "BUDGET",
        recipe: &[
            "cover",
            "quick_start",
            "bills_calendar",
            "bills_due_table",
            "payment_log",
            "category_budget",
            "expense_log",
            "notes_summary",
        ],
        preview_pages: [0, 2, 3],
        cover_subtitle: "A clean system for due dates",
        included_lines: &[
            "Bills calendar and due table",
            "Payment log and category budget",
            "Expense log and notes summary",
        ],
        howto_lines: &[
            "Write recurring bills first",
            "Check off when paid",
            "Do a fast monthly reset",
        ],
    },
    Archetype {
        key: "debt_payoff",
        niche: "BUDGET",
        recipe: &[
            "cover",
            "quick_start",
            "debt_list",
            "avalanche_tracker",
            "snowball_tracker",
            "payment_log",
            "progress_meter",
            "notes_summary",
        ],
        preview_pages: [0, 2, 3],
        cover_subtitle: "A payoff plan you can follow",
        included_lines: &[
            "Debt list and payment log",
            "Avalanche and snowball trackers",
            "Progress meter and notes",
        ],
        howto_lines: &[
            "List balances from statements",
            "Pick avalanche or snowball",
            "Track each payment you make",
        ],
    },
    Archetype {
        key: "annual_overview",
        niche: "BUDGET",
        recipe: &[
            "cover",
            "quick_start",
            "annual_overview",
            "monthly_overview",
            "income_summary",
            "expense_summary",
            "savings_goal_tracker",
            "notes_summary",
        ],
        preview_pages: [0, 2, 3],
        cover_subtitle: "Year-at-a-glance money dashboard",
        included_lines: &[
            "Annual and monthly overview pages",
            "Income and expense summaries",
            "Savings goal tracker and notes",
        ],
        howto_lines: &[
            "Update totals once a month",
            "Compare months using summaries",
            "Keep goals visible all year",
        ],
    },
    Archetype {
        key: "savings_goal",
        niche: "BUDGET",
        recipe: &[
            "cover",
            "quick_start",
            "savings_goal_tracker",
            "sinking_funds",
            "no_spend_calendar",
            "challenge_tracker",
            "expense_log",
            "notes_summary",
        ],
        preview_pages: [0, 2, 4],
        cover_subtitle: "Small wins that add up",
        included_lines: &[
            "Savings goal and sinking funds",
            "No-spend calendar and challenges",
            "Expense log and notes summary",
        ],
        howto_lines: &[
            "Pick one goal per sheet",
            "Track weekly deposits",
            "Use challenges for momentum",
        ],
    },
    Archetype {
        key: "brain_dump",
        niche: "ADHD",
        recipe: &[
            "cover",
            "quick_start",
            "inbox_capture",
            "clarify_next_action",
            "priority_matrix",
            "time_block",
            "habit_grid",
            "notes_summary",
        ],
        preview_pages: [0, 2, 4],
        cover_subtitle: "Get thoughts out. Get moving.",
        included_lines: &[
            "Inbox capture and next actions",
            "Priority matrix and time blocks",
            "Habit grid and notes summary",
        ],
        howto_lines: &[
            "Dump everything into Inbox first",
            "Convert items to next actions",
            "Plan one focused block at a time",
        ],
    },
    Archetype {
        key: "focus_blocks",
        niche: "ADHD",
        recipe: &[
            "cover",
            "quick_start",
            "focus_blocks",
            "deep_work_log",
            "distraction_log",
            "break_plan",
            "mood_checkin",
            "notes_summary",
        ],
        preview_pages: [0, 2, 3],
        cover_subtitle: "A lightweight focus system",
        included_lines: &[
            "Focus blocks and deep work log",
            "Distraction log and break plan",
            "Mood check-in and notes summary",
        ],
        howto_lines: &[
            "Set one block goal",
            "Log distractions fast",
            "Plan breaks before you start",
        ],
    },
    Archetype {
        key: "routine_builder",
        niche: "ADHD",
        recipe: &[
            "cover",
            "quick_start",
            "morning_routine",
            "evening_routine",
            "weekly_routine",
            "habit_grid",
            "gratitude_log",
            "notes_summary",
        ],
        preview_pages: [0, 2, 4],
        cover_subtitle: "Routines that feel doable",
        included_lines: &[
            "Morning and evening routines",
            "Weekly routine and habit grid",
            "Gratitude and notes summary",
        ],
        howto_lines: &[
            "Start with the smallest version",
            "Repeat for one week",
            "Adjust, do not restart",
        ],
    },
    Archetype {
        key: "weekly_review",
        niche: "ADHD",
        recipe: &[
            "cover",
            "quick_start",
            "weekly_goals",
            "daily_priorities",
            "wins_lessons",
            "next_week_plan",
            "habit_grid",
            "notes_summary",
        ],
        preview_pages: [0, 2, 5],
        cover_subtitle: "Close the week. Reset the next.",
        included_lines: &[
            "Weekly goals and daily priorities",
            "Wins/lessons and next-week plan",
            "Habit grid and notes summary",
        ],
        howto_lines: &[
            "Pick 3 outcomes for the week",
            "Choose one priority per day",
            "Review once, then move on",
        ],
    },
    Archetype {
        key: "project_planner",
        niche: "ADHD",
        recipe: &[
            "cover",
            "quick_start",
            "project_overview",
            "task_backlog",
            "kanban_board",
            "milestones",
            "meeting_notes",
            "notes_summary",
        ],
        preview_pages: [0, 2, 3],
        cover_subtitle: "From ideas to finished",
        included_lines: &[
            "Project overview and task backlog",
            "Kanban and milestones",
            "Meeting notes and summary",
        ],
        howto_lines: &[
            "Define the next milestone",
            "Pull tasks into Doing",
            "Keep notes in one system",
        ],
    },
];

pub fn archetype_by_key(key: &str) -> Option<&'static Archetype> {
    ARCHETYPES.iter().find(|a| a.key == key)
}

/// Stable MD5-derived integer used for all pseudo-random selection.
pub fn hash_int(text: &str) -> u128 {
    u128::from_be_bytes(md5::compute(text.as_bytes()).0)
}

pub fn pick_theme(seed_text: &str) -> &'static str {
    let idx = (hash_int(seed_text) % THEMES.len() as u128) as usize;
    THEMES[idx]
}

pub fn pick_archetype(slug: &str, niche: &str, title: &str) -> &'static Archetype {
    let s = slug.to_lowercase();
    let t = title.to_lowercase();
    let n = niche.trim().to_uppercase();

    // Keyword matches first; more specific products should not all collapse
    // onto the hash fallback.
    let keyword_key = if s.contains("cash-flow") || t.contains("cash flow") || t.contains("forecast")
    {
        Some("cash_flow")
    } else if s.contains("bill") || s.contains("due") || t.contains("bill") || t.contains("due date")
    {
        Some("bills_due")
    } else if s.contains("debt")
        || s.contains("avalanche")
        || s.contains("snowball")
        || t.contains("payoff")
    {
        Some("debt_payoff")
    } else if s.contains("annual") || s.contains("year") || t.contains("yearly") {
        Some("annual_overview")
    } else if s.contains("savings")
        || s.contains("save")
        || s.contains("goal")
        || s.contains("no-spend")
        || t.contains("challenge")
    {
        Some("savings_goal")
    } else if s.contains("brain-dump")
        || t.contains("brain dump")
        || t.contains("inbox")
        || t.contains("capture")
    {
        Some("brain_dump")
    } else if s.contains("focus") || t.contains("deep work") || t.contains("distraction") {
        Some("focus_blocks")
    } else if s.contains("routine") || t.contains("morning") || t.contains("evening") {
        Some("routine_builder")
    } else if s.contains("weekly-review") || t.contains("weekly review") || t.contains("wins") {
        Some("weekly_review")
    } else if s.contains("project") || t.contains("kanban") || t.contains("milestone") {
        Some("project_planner")
    } else {
        None
    };

    if let Some(key) = keyword_key {
        if let Some(archetype) = archetype_by_key(key) {
            return archetype;
        }
    }

    // Fallback: hash the slug over the niche's archetype list.
    let keys: &[&str] = if n == "BUDGET" { &BUDGET_KEYS } else { &ADHD_KEYS };
    let idx = (hash_int(slug) % keys.len() as u128) as usize;
    archetype_by_key(keys[idx]).unwrap_or(&ARCHETYPES[0])
}
