//! 内置故事：学生们为黑客松奖学金奋战的五天。

use chrono::{TimeZone, Utc};

use super::{NarrationCue, PageSpec, Storybook};
use crate::timeline::{AnimationStep, Effect, PageState, Transition};

pub(super) fn book() -> Storybook {
    Storybook::new(
        "Hackathon Story",
        vec![intro(), first_day(), second_day(), final_day(), last_page()],
    )
}

fn intro() -> PageSpec {
    PageSpec::new(
        "intro",
        NarrationCue::new(
            "Once upon a time there was a lot of students who were doing their best \
             to get scholarships to Dub-Dub in San Jose",
        ),
    )
    .with_title("Once upon a time...")
    .with_initial(PageState::with_properties([
        ("title_pulse", 0.0),
        ("heads_offset", -300.0),
    ]))
    .with_steps(vec![
        AnimationStep::forever(
            "title_pulse",
            0.0,
            1.0,
            Effect::toggle("title_pulse").with_transition(Transition::ease_in_out(1.0)),
        ),
        AnimationStep::once(
            "heads_slide_in",
            0.0,
            Effect::set("heads_offset", 0.0).with_transition(Transition::ease_in_out(7.0)),
        ),
    ])
}

fn first_day() -> PageSpec {
    PageSpec::new(
        "first_day",
        NarrationCue::new(
            "Each year, around the same period of the year, the WWDC Scholarship contest \
             is announced. This is the time when they gather around their MacBooks, \
             building amazing software to showcase their skill and passion to become \
             the WWDC Scholars",
        ),
    )
    .with_title("Core values: Learn • Create • Share")
    .with_initial(PageState::with_properties([
        ("characters_alpha", 0.0),
        ("bubbles_scale", 0.0),
    ]))
    .with_steps(vec![
        AnimationStep::once(
            "characters_fade_in",
            0.5,
            Effect::set("characters_alpha", 1.0).with_transition(Transition::ease_in(1.0)),
        ),
        AnimationStep::once(
            "bubbles_pop_in",
            2.0,
            Effect::set("bubbles_scale", 1.0).with_transition(Transition::spring(0.5)),
        ),
    ])
}

fn second_day() -> PageSpec {
    let mut initial = vec![("birds_up".to_string(), 0.0), ("night".to_string(), 0.0)];
    let mut steps = vec![AnimationStep::forever(
        "birds_flap",
        0.0,
        2.0,
        Effect::toggle("birds_up").with_transition(Transition::ease_in_out(2.0)),
    )];

    // 四个代码气泡每隔两秒依次出现，随后放大
    for i in 0..4 {
        let start = f64::from(i) * 2.0;
        initial.push((format!("code_bubble_{i}_alpha"), 0.0));
        initial.push((format!("code_bubble_{i}_scale"), 1.0));
        steps.push(AnimationStep::once(
            format!("code_bubble_{i}_show"),
            start,
            Effect::set(format!("code_bubble_{i}_alpha"), 1.0)
                .with_transition(Transition::ease_in(0.5)),
        ));
        steps.push(AnimationStep::once(
            format!("code_bubble_{i}_grow"),
            start + 0.5,
            Effect::set(format!("code_bubble_{i}_scale"), 1.2)
                .with_transition(Transition::spring(1.0)),
        ));
    }

    steps.push(AnimationStep::once(
        "nightfall",
        8.0,
        Effect::set("night", 1.0).with_transition(Transition::ease_in_out(2.0)),
    ));

    PageSpec::new(
        "second_day",
        NarrationCue::new(
            "Once they start building their software ideas, they go a long way till they \
             create what they initially desired. In the meantime there may come bugs, \
             necessity to learn new APIs and SDKs and so on. Truth to be told, they do not \
             have to worry about any of those things as they belong to the iOS community",
        ),
    )
    .with_title("Coding through day and night...")
    .with_initial(PageState::with_properties(initial))
    .with_steps(steps)
}

fn final_day() -> PageSpec {
    let announcement = Utc.with_ymd_and_hms(2026, 4, 20, 8, 0, 0).single();

    let page = PageSpec::new(
        "final_day",
        NarrationCue::new(
            "Finally, after co-operating and helping each other for one week, they had to \
             submit their robust playgrounds. Feeling anxious and nervous about the results, \
             they started looking into uncertain future",
        ),
    )
    .with_title("Hackathon Winners Announcement")
    .with_initial(PageState::with_properties([
        ("sweat_alpha", 0.0),
        ("sweat_down", 0.0),
    ]))
    .with_steps(vec![
        AnimationStep::once(
            "sweat_appear",
            1.0,
            Effect::set("sweat_alpha", 1.0).with_transition(Transition::ease_in(0.5)),
        ),
        AnimationStep::forever(
            "sweat_drip",
            1.0,
            3.0,
            Effect::toggle("sweat_down").with_transition(Transition::linear(3.0)),
        ),
    ]);

    match announcement {
        Some(target) => page.with_countdown(target),
        None => page,
    }
}

fn last_page() -> PageSpec {
    PageSpec::new(
        "last_page",
        NarrationCue::new("Here starts the story of great anticipation").delayed(1.5),
    )
    .with_title("To be continued...")
    .with_initial(PageState::with_properties([
        ("text_offset", -400.0),
        ("rotation", 0.0),
    ]))
    .with_steps(vec![
        AnimationStep::once(
            "text_drop_in",
            0.0,
            Effect::set("text_offset", 100.0).with_transition(Transition::ease_out(2.0)),
        ),
        AnimationStep::forever(
            "spin",
            1.5,
            1.2,
            Effect::add("rotation", 360.0).with_transition(Transition::linear(1.2)),
        ),
    ])
}
