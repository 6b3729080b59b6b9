// MIT License
//
// Copyright (c) 2024 Jerome Johnson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use dry_liquid::{Engine, Error, MemoryLoader, Options};
use pretty_assertions::assert_eq;
use serde_json::json;

fn engine(loader: MemoryLoader) -> Engine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Engine::with_loader(Options::default(), loader)
}

async fn render(engine: &Engine, src: &str) -> String {
    engine.parse_and_render(src, &json!({})).await.unwrap()
}

#[tokio::test]
async fn child_overrides_one_block_of_its_layout() {
    let engine = engine(MemoryLoader::new().with(
        "layout.liquid",
        "Title: {% block title %}Default{% endblock %} Body: {% block content %}{% endblock %}",
    ));
    let out = render(
        &engine,
        "{% extends 'layout' %}{% block title %}Child{% endblock %}",
    )
    .await;
    assert_eq!(out, "Title: Child Body: ");
}

#[tokio::test]
async fn block_super_inserts_the_layout_content() {
    let engine = engine(MemoryLoader::new().with("layout.liquid", "{% block list %}A,B{% endblock %}"));
    let out = render(
        &engine,
        "{% extends 'layout' %}{% block list %}{{block.super}},C{% endblock %}",
    )
    .await;
    assert_eq!(out, "A,B,C");
}

fn chain(mid: &str) -> Engine {
    engine(
        MemoryLoader::new()
            .with("root.liquid", "[{% block x %}R{% endblock %}]")
            .with("mid.liquid", format!("{{% extends 'root' %}}{}", mid)),
    )
}

#[tokio::test]
async fn block_super_resolves_to_the_nearest_ancestor() {
    let engine = chain("{% block x %}M{% endblock %}");
    let out = render(
        &engine,
        "{% extends 'mid' %}{% block x %}L {{ block.super }}{% endblock %}",
    )
    .await;
    assert_eq!(out, "[L M]");
}

#[tokio::test]
async fn block_super_skips_levels_without_the_block() {
    let engine = chain("ignored");
    let out = render(
        &engine,
        "{% extends 'mid' %}{% block x %}L {{ block.super }}{% endblock %}",
    )
    .await;
    assert_eq!(out, "[L R]");
}

#[tokio::test]
async fn block_super_chains_through_every_level() {
    let engine = chain("{% block x %}M {{ block.super }}{% endblock %}");
    let out = render(
        &engine,
        "{% extends 'mid' %}{% block x %}L {{ block.super }}{% endblock %}",
    )
    .await;
    assert_eq!(out, "[L M R]");
}

#[tokio::test]
async fn leaf_wins_over_every_ancestor() {
    let engine = chain("{% block x %}M{% endblock %}");
    let out = render(&engine, "{% extends 'mid' %}{% block x %}L{% endblock %}").await;
    assert_eq!(out, "[L]");
}

#[tokio::test]
async fn nested_blocks_merge_independently() {
    let engine = engine(MemoryLoader::new().with(
        "layout.liquid",
        "{% block page %}<{% block head %}H{% endblock %}|{% block body %}B{% endblock %}>{% endblock %}",
    ));
    let out = render(
        &engine,
        "{% extends 'layout' %}{% block body %}{{ block.super }}b{% endblock %}",
    )
    .await;
    assert_eq!(out, "<H|Bb>");
}

#[tokio::test]
async fn layout_sees_variables_assigned_in_blocks() {
    let engine = engine(MemoryLoader::new().with(
        "layout.liquid",
        "{% block setup %}{% endblock %}{{ title | default: 'none' }}",
    ));
    let out = render(
        &engine,
        "{% extends 'layout' %}{% block setup %}{% assign title = 'set' %}{% endblock %}",
    )
    .await;
    assert_eq!(out, "set");
}

#[test]
fn extends_is_only_accepted_as_the_first_token() {
    let engine = engine(MemoryLoader::new().with("layout.liquid", "x"));
    assert!(engine.parse("{% extends 'layout' %}").is_ok());
    for src in [
        "\n{% extends 'layout' %}",
        "{{ a }}{% extends 'layout' %}",
        "{% extends 'layout' %}{% extends 'layout' %}",
        "{% if a %}{% extends 'layout' %}{% endif %}",
    ] {
        assert!(matches!(engine.parse(src), Err(Error::Parse { .. })), "{src:?}");
    }
}

#[test]
fn extends_tag_is_removed_from_the_tree() {
    let engine = engine(MemoryLoader::new().with("layout.liquid", "L"));
    let template = engine.parse("{% extends 'layout' %}").unwrap();
    assert_eq!(template.outline(), "\"L\"\n");
}

#[tokio::test]
async fn layouts_come_from_the_cache_when_enabled() {
    let loader = MemoryLoader::new()
        .with("layout.liquid", "<{% block b %}{% endblock %}>")
        .with("page.liquid", "{% extends 'layout' %}{% block b %}{{ n }}{% endblock %}");
    let options = Options {
        cache: true,
        ..Options::default()
    };
    let engine = Engine::with_loader(options, loader);
    for n in 1..=2 {
        let out = engine.render_file("page", &json!({ "n": n })).await.unwrap();
        assert_eq!(out, format!("<{}>", n));
    }
}
