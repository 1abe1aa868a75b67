// LLM-friendly documentation endpoint content.

pub const LLMS_TXT: &str = r#"# Siege Guide API
> A fan reference for Rainbow Six Siege operators and maps, with an AI lineup suggestor.

## API Base URL
/api/

## Authentication
None. The lineup suggestor is rate limited per client.

## Key Endpoints
- GET /api/operators - Operators grouped into attackers and defenders
- GET /api/operators?side=Attacker - Operators on one side
- GET /api/operators/{slug} - Operator detail (e.g. /api/operators/jäger)
- GET /api/maps - List maps
- GET /api/maps/{slug} - Map detail (e.g. /api/maps/kafe-dostoyevsky)
- GET /api/map-sites/{name} - Defender sites for a map
- GET /api/game-info - Informational sections in display order
- GET /api/search?query=ash - Case-insensitive operator name search
- POST /api/lineup-suggestion - Suggest operators for a situation

## Lineup Suggestion
Request body (JSON):
  {"map_name": "Oregon", "site": "Basement", "side": "Attacker",
   "solo_queue": false, "situation": "Defenders stack basement"}
Response: {"operators": [...], "error": null}
Only operators that exist in the catalog on the requested side are returned.
When nothing matches, "operators" is empty and "error" explains why.

## Operations
- GET /health - Service status
- GET /metrics - Prometheus metrics
"#;
