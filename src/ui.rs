use crate::ledger::GOAL;

pub fn render_index(fast_goal_hours: u32) -> String {
    INDEX_HTML
        .replace("{{GOAL}}", &GOAL.to_string())
        .replace("{{FAST_GOAL_HOURS}}", &fast_goal_hours.to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Daily Habits</title>
  <style>
    :root {
      --bg: #0f172a;
      --card: #1e293b;
      --ink: #e2e8f0;
      --muted: #94a3b8;
      --accent: #f97316;
      --done: #22c55e;
      --fast: #a78bfa;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 16px;
    }

    main {
      width: min(760px, 100%);
      display: grid;
      gap: 20px;
    }

    section {
      background: var(--card);
      border-radius: 20px;
      padding: 24px;
      display: grid;
      gap: 14px;
    }

    h1, h2 {
      margin: 0;
    }

    .muted {
      color: var(--muted);
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(3, 1fr);
      gap: 12px;
    }

    .stat .value {
      font-size: 1.8rem;
      font-weight: 700;
    }

    .bar {
      height: 12px;
      background: #334155;
      border-radius: 999px;
      overflow: hidden;
    }

    .bar > div {
      height: 100%;
      width: 0;
      background: var(--accent);
      transition: width 300ms ease;
    }

    .bar.fast > div {
      background: var(--fast);
    }

    .bar.complete > div {
      background: var(--done);
    }

    .row {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
      align-items: center;
    }

    button, input {
      font: inherit;
      border-radius: 10px;
      border: 1px solid #475569;
      background: #0b1220;
      color: var(--ink);
      padding: 8px 14px;
    }

    button {
      cursor: pointer;
    }

    button:disabled, input:disabled {
      opacity: 0.4;
      cursor: not-allowed;
    }

    .calendar {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
    }

    .calendar .name {
      text-align: center;
      font-size: 0.8rem;
      color: var(--muted);
    }

    .day {
      aspect-ratio: 1;
      padding: 0;
    }

    .day.blank {
      visibility: hidden;
    }

    .day.active {
      border-color: var(--accent);
    }

    .day.done {
      background: var(--done);
      color: #052e16;
    }

    .day.selected {
      outline: 2px solid var(--ink);
    }

    .day.today {
      font-weight: 700;
    }

    .celebrate {
      animation: pop 600ms ease;
    }

    @keyframes pop {
      50% { transform: scale(1.06); }
    }

    .hidden {
      display: none;
    }

    .error {
      color: #f87171;
    }
  </style>
</head>
<body>
  <main>
    <section id="reps">
      <div class="row">
        <h1 id="dateLabel">Today's Progress</h1>
        <button id="returnToday" class="hidden">Back to today</button>
      </div>
      <div class="stats">
        <div class="stat"><div class="muted">Count</div><div class="value" id="count">0</div></div>
        <div class="stat"><div class="muted">Streak</div><div class="value" id="streak">0</div></div>
        <div class="stat"><div class="muted">Total</div><div class="value" id="total">0</div></div>
      </div>
      <div class="bar" id="progressBar"><div></div></div>
      <p class="muted" id="message">{{GOAL}} more to go</p>
      <div class="row">
        <button class="quick" data-add="10">+10</button>
        <button class="quick" data-add="20">+20</button>
        <button class="quick" data-add="25">+25</button>
        <button class="quick" data-add="50">+50</button>
        <form id="customForm" class="row">
          <input id="customInput" type="number" min="1" placeholder="Custom" />
          <button type="submit">Add</button>
        </form>
        <button id="undo">Undo 10</button>
      </div>
      <div class="row">
        <button id="prevMonth">&larr;</button>
        <h2 id="monthLabel"></h2>
        <button id="nextMonth">&rarr;</button>
      </div>
      <div class="calendar" id="calendar"></div>
    </section>

    <section id="fasting">
      <div class="row">
        <h1>Fasting</h1>
        <span class="muted" id="fastStatus">No active fast</span>
      </div>
      <div id="fastIdle" class="row">
        <button id="startNow">Start now</button>
        <input id="startAt" type="datetime-local" />
        <button id="startAtConfirm">Start at time</button>
      </div>
      <div id="fastActive" class="hidden">
        <div class="stat"><div class="value" id="fastElapsed">0:00:00</div></div>
        <p class="muted"><span id="fastStarted"></span> &middot; goal {{FAST_GOAL_HOURS}}h</p>
        <div class="bar fast" id="fastBar"><div></div></div>
        <button id="endFast">End fast</button>
      </div>
      <p class="error" id="fastError"></p>
      <div id="fastHistory"></div>
    </section>
  </main>

  <script>
    const $ = (id) => document.getElementById(id);

    const request = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: { 'content-type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body)
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      return res.json();
    };

    const setBar = (bar, fraction) => {
      bar.firstElementChild.style.width = `${Math.round(fraction * 100)}%`;
      bar.classList.toggle('complete', fraction >= 1);
    };

    const renderLog = (view) => {
      $('dateLabel').textContent = view.date_label;
      $('count').textContent = view.count;
      $('streak').textContent = view.streak;
      $('total').textContent = view.total.toLocaleString();
      $('message').textContent = view.message;
      $('returnToday').classList.toggle('hidden', view.is_today);
      setBar($('progressBar'), view.progress);

      document.querySelectorAll('.quick').forEach((btn) => {
        btn.disabled = !view.controls_enabled;
      });
      $('customInput').disabled = !view.controls_enabled;
      $('undo').disabled = !view.can_undo;

      $('monthLabel').textContent = view.calendar.label;
      const grid = $('calendar');
      grid.innerHTML = '';
      view.calendar.weekdays.forEach((name) => {
        const label = document.createElement('div');
        label.className = 'name';
        label.textContent = name;
        grid.appendChild(label);
      });
      view.calendar.cells.forEach((cell) => {
        const btn = document.createElement('button');
        btn.type = 'button';
        if (cell.kind === 'blank') {
          btn.className = 'day blank';
          grid.appendChild(btn);
          return;
        }
        btn.className = `day ${cell.status}`;
        btn.classList.toggle('selected', cell.is_selected);
        btn.classList.toggle('today', cell.is_today);
        btn.textContent = cell.day;
        btn.title = `${cell.date} • ${cell.count} reps`;
        btn.addEventListener('click', () => {
          request('POST', '/api/log/select', { date: cell.date }).then(renderLog).catch(showError);
        });
        grid.appendChild(btn);
      });
    };

    const applyUpdate = (update) => {
      renderLog(update.view);
      if (update.outcome === 'goal_reached') {
        const section = $('reps');
        section.classList.remove('celebrate');
        void section.offsetWidth;
        section.classList.add('celebrate');
      }
    };

    const renderFasting = (view) => {
      const active = view.status === 'fasting';
      $('fastStatus').textContent = view.status_label;
      $('fastIdle').classList.toggle('hidden', active);
      $('fastActive').classList.toggle('hidden', !active);
      $('fastStarted').textContent = view.started_label ? `Started ${view.started_label}` : '';
      $('fastElapsed').textContent = view.elapsed || '0:00:00';
      setBar($('fastBar'), view.progress);

      const history = $('fastHistory');
      history.innerHTML = '';
      if (view.history.length > 0) {
        const title = document.createElement('p');
        title.className = 'muted';
        title.textContent = 'Recent fasts';
        history.appendChild(title);
      }
      view.history.forEach((entry) => {
        const row = document.createElement('div');
        row.className = 'row';
        row.textContent = `${entry.date_label} · ${entry.duration_label}`;
        history.appendChild(row);
      });
    };

    const showError = (err) => {
      $('fastError').textContent = err.message;
    };

    const ticks = new EventSource('/api/fasting/ticks');
    ticks.addEventListener('tick', (event) => {
      const tick = JSON.parse(event.data);
      $('fastElapsed').textContent = tick.elapsed;
      setBar($('fastBar'), tick.progress);
    });

    document.querySelectorAll('.quick').forEach((btn) => {
      btn.addEventListener('click', () => {
        request('POST', '/api/log/add', { amount: Number(btn.dataset.add) }).then(applyUpdate).catch(showError);
      });
    });

    $('customForm').addEventListener('submit', (event) => {
      event.preventDefault();
      const input = $('customInput');
      request('POST', '/api/log/add', { amount: input.value })
        .then((update) => {
          if (update.outcome !== 'ignored') {
            input.value = '';
          }
          applyUpdate(update);
        })
        .catch(showError);
    });

    $('undo').addEventListener('click', () => {
      request('POST', '/api/log/undo').then(applyUpdate).catch(showError);
    });
    $('returnToday').addEventListener('click', () => {
      request('POST', '/api/log/today').then(renderLog).catch(showError);
    });
    $('prevMonth').addEventListener('click', () => {
      request('POST', '/api/log/month', { delta: -1 }).then(renderLog).catch(showError);
    });
    $('nextMonth').addEventListener('click', () => {
      request('POST', '/api/log/month', { delta: 1 }).then(renderLog).catch(showError);
    });

    $('startNow').addEventListener('click', () => {
      $('fastError').textContent = '';
      request('POST', '/api/fasting/start', {}).then(renderFasting).catch(showError);
    });
    $('startAtConfirm').addEventListener('click', () => {
      const value = $('startAt').value;
      if (!value) {
        return;
      }
      $('fastError').textContent = '';
      request('POST', '/api/fasting/start', { start_time: value }).then(renderFasting).catch(showError);
    });
    $('endFast').addEventListener('click', () => {
      request('POST', '/api/fasting/end').then(renderFasting).catch(showError);
    });

    request('GET', '/api/log').then(renderLog).catch(showError);
    request('GET', '/api/fasting').then(renderFasting).catch(showError);
  </script>
</body>
</html>
"#;
