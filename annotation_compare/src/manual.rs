/*!

This is the long-form manual for `annotation_compare` and `anncmp`.

## Input records

`anncmp` reads folders of JSON files, one annotation record per file:

```text
{
  "database": "mitdb",
  "record": "100",
  "annotator": "alice@example.org",
  "conclusionThesaurus": "ecg-2019",
  "conclusions": [1, 2, 15]
}
```

Codes in `conclusions` may be integers or strings. Integer codes are sorted
numerically and always before string codes.

Files that are not valid UTF-8 JSON, or that miss one of `database`, `record`,
`annotator` or `conclusions`, are skipped with a warning. Files with
`"type": "cmpresult"` are saved comparison results and are ignored.

When the same annotator provides the same record twice, the last file read wins.

### Thesaurus version

All the records of one comparison are expected to use the same thesaurus.
The version used by the majority of the records (the first one seen in case of
a tie) is kept, and every other record is removed and listed in the report
under `removedRecords`.

## Thesaurus

The `--thesaurus` option points to the vocabulary of all the valid codes:

```text
{
  "thesaurus": "ecg-2019",
  "language": "en",
  "groups": [
    { "reports": [ { "id": 1, "name": "Sinus rhythm" }, { "id": 2, "name": "Sinus tachycardia" } ] }
  ]
}
```

The number of codes in the thesaurus is the size of the universe used to
compute the true negatives. Without a thesaurus, the universe is the number
of distinct codes found in all the records. The agreement report drops the
codes outside the thesaurus and follows its order.

## Statistics

For a reference annotator and a compared one, only the records annotated by
both are considered. For each such record:
- a code assigned by both is a true positive (TP)
- a code assigned only by the compared annotator is a false positive (FP)
- a code assigned only by the reference is a false negative (FN)

and `TN = universe - (TP + FP + FN)`. The statistics are:

| name | formula               |
|------|-----------------------|
| Se   | TP / (TP + FN)        |
| Sp   | TN / (FP + TN)        |
| PPV  | TP / (TP + FP)        |
| NPV  | TN / (TN + FN)        |
| Acc  | (TP + TN) / universe  |

A statistic with a zero denominator is undefined (`null` in the reports).
Two annotators without any shared record, or only with records without codes,
are reported as `noComparableData`. If the universe is smaller than
`TP + FP + FN`, the pair is reported as an `error`: the universe size is wrong
for this data.

## Annotator limits

At least 2 annotators are needed (`--min-annotators`). Above
`--max-annotators` (5 by default), only the annotators with the most records
are compared, and the others are listed under `excludedAnnotators`.

## Configuration

All the options can also be provided in a JSON file with `--config`. Relative
paths are resolved from the folder of the configuration file, and the command
line options take precedence.

```text
{
  "inputPaths": ["data"],
  "thesaurusPath": "thesaurus.json",
  "outputPath": "stats.json",
  "agreementOutputPath": "conclusions-annotators.json",
  "maxAnnotators": 5,
  "minAnnotators": 2
}
```

## Outputs

- `--out`: the statistics report (`stdout` by default)
- `--agreement-out`: for every record, the annotators of each code
- `--match-counts-out`: for every annotator, the number of matches per code
  with every other annotator
- `--ref-annotator` and `--test-annotator`: the detailed comparison of two
  annotators, record by record
- `--summary`: counts of records and codes, logged at the start
- `--reference`: an expected statistics report. `anncmp` fails and prints the
  differences if the computed report does not match it.

 */
